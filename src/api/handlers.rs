//! HTTP API handlers.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::{RelayError, ValidationError};
use crate::escape::escape_html;
use crate::metrics;
use crate::submission::ContactSubmission;
use crate::upstream::UpstreamClient;

const PAGE_TEMPLATE: &str = include_str!("../../static/index.html");
const RELAY_PATH_PLACEHOLDER: &str = "{{RELAY_PATH}}";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream client holding the credential.
    pub upstream: UpstreamClient,
    /// Path of the relay endpoint.
    pub relay_path: Arc<str>,
    /// Largest submission body accepted on the relay path.
    pub max_body_bytes: usize,
    /// Rendered form page.
    pub page: Arc<str>,
    /// Allowed CORS origin.
    pub cors_origin: Option<HeaderValue>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create app state from config.
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let upstream = UpstreamClient::new(config)?;

        let cors_origin = config
            .cors_allow_origin
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| RelayError::Invalid(format!("CORS_ALLOW_ORIGIN: {}", e)))?;

        Ok(Self {
            upstream,
            relay_path: Arc::from(config.relay_path.as_str()),
            max_body_bytes: config.max_body_bytes,
            page: Arc::from(render_page(&config.relay_path)),
            cors_origin,
            metrics: None,
        })
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("upstream", &self.upstream)
            .field("relay_path", &self.relay_path)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("cors_origin", &self.cors_origin)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

/// Render the form page so it posts to `relay_path`.
pub fn render_page(relay_path: &str) -> String {
    PAGE_TEMPLATE.replace(RELAY_PATH_PLACEHOLDER, &escape_html(relay_path))
}

/// Envelope returned when the upstream accepted the submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RelaySuccess {
    /// Always `true`.
    pub success: bool,
    /// Upstream body, uninterpreted.
    #[schema(value_type = Object)]
    pub response: serde_json::Value,
}

impl RelaySuccess {
    /// Wrap an upstream body.
    pub fn new(response: serde_json::Value) -> Self {
        Self {
            success: true,
            response,
        }
    }
}

/// Envelope returned for invalid input or upstream failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RelayFailure {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason.
    #[schema(example = "Invalid input")]
    pub message: String,
}

impl RelayFailure {
    /// Build a failure envelope.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Contact page handler.
pub async fn contact_page(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}

/// Relay a contact submission upstream.
///
/// The body is read as raw bytes so that any decoding problem, including a
/// body over the size limit, produces the standard invalid-input envelope.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactSubmission,
    responses(
        (status = 200, description = "Submission forwarded", body = RelaySuccess),
        (status = 400, description = "Missing, malformed or oversized body", body = RelayFailure),
        (status = 502, description = "Upstream failed or rejected the submission", body = RelayFailure),
        (status = 504, description = "Upstream timed out", body = RelayFailure)
    )
)]
#[instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RelaySuccess>, RelayError> {
    metrics::inc_submissions_received();

    let submission = body
        .map_err(|rejection| ValidationError::UnreadableBody(rejection.body_text()))
        .and_then(|body| ContactSubmission::from_json_bytes(&body))
        .inspect_err(|e| {
            warn!(reason = %e, "rejected submission");
            metrics::inc_submissions_rejected();
        })?;

    let reply = state
        .upstream
        .forward(&submission.escaped())
        .await?;

    metrics::inc_submissions_forwarded();
    info!(status = reply.status, "submission forwarded");

    Ok(Json(RelaySuccess::new(reply.body)))
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus scrape handler - 404 when no recorder is installed.
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
