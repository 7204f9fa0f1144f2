//! Prometheus metrics for submissions and upstream calls.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Upstream call latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_latency_ms";
/// Submissions received counter metric name.
pub const METRIC_SUBMISSIONS_RECEIVED: &str = "submissions_received_total";
/// Submissions rejected by validation counter metric name.
pub const METRIC_SUBMISSIONS_REJECTED: &str = "submissions_rejected_total";
/// Submissions forwarded successfully counter metric name.
pub const METRIC_SUBMISSIONS_FORWARDED: &str = "submissions_forwarded_total";
/// Upstream failures counter metric name.
pub const METRIC_UPSTREAM_FAILURES: &str = "upstream_failures_total";

/// Install the Prometheus recorder and register metric descriptions.
/// Call this once at startup.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream forward latency in milliseconds"
    );

    describe_counter!(
        METRIC_SUBMISSIONS_RECEIVED,
        "Total number of contact submissions received"
    );
    describe_counter!(
        METRIC_SUBMISSIONS_REJECTED,
        "Total number of submissions rejected as invalid input"
    );
    describe_counter!(
        METRIC_SUBMISSIONS_FORWARDED,
        "Total number of submissions accepted by the upstream"
    );
    describe_counter!(
        METRIC_UPSTREAM_FAILURES,
        "Total number of failed upstream calls, by kind"
    );

    debug!("Metrics initialized");
}

/// Increment submissions received counter.
pub fn inc_submissions_received() {
    counter!(METRIC_SUBMISSIONS_RECEIVED).increment(1);
}

/// Increment submissions rejected counter.
pub fn inc_submissions_rejected() {
    counter!(METRIC_SUBMISSIONS_REJECTED).increment(1);
}

/// Increment submissions forwarded counter.
pub fn inc_submissions_forwarded() {
    counter!(METRIC_SUBMISSIONS_FORWARDED).increment(1);
}

/// Increment upstream failures counter for the given failure kind.
pub fn inc_upstream_failures(kind: &'static str) {
    counter!(METRIC_UPSTREAM_FAILURES, "kind" => kind).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for the upstream forward.
pub fn timer_upstream() -> LatencyTimer {
    LatencyTimer::new(METRIC_UPSTREAM_LATENCY)
}
