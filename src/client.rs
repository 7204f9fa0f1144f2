//! Form client: submit a contact to the relay and present the outcome.
//!
//! Mirrors what the browser page does, for use from the command line.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::submission::ContactSubmission;

/// Notice shown when the request itself fails.
pub const REQUEST_FAILED_NOTICE: &str = "Request failed. Check the logs for details.";

/// Fallback when a failure envelope carries no message.
pub const UNKNOWN_ERROR: &str = "Unknown error.";

/// Errors raised before an envelope could be decoded.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failure talking to the relay.
    #[error("relay request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Relay answered with something other than an envelope.
    #[error("could not decode relay response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Envelope as returned by the relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayEnvelope {
    /// Whether the submission went through.
    #[serde(default)]
    pub success: bool,
    /// Upstream body on success.
    #[serde(default)]
    pub response: Option<Value>,
    /// Reason on failure.
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of a submission, as the user sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// Relay reported success with the upstream body.
    Delivered(Value),
    /// Relay reported failure, possibly with a reason.
    Failed(Option<String>),
}

impl From<RelayEnvelope> for RelayOutcome {
    fn from(envelope: RelayEnvelope) -> Self {
        if envelope.success {
            RelayOutcome::Delivered(envelope.response.unwrap_or(Value::Null))
        } else {
            RelayOutcome::Failed(envelope.message.filter(|m| !m.is_empty()))
        }
    }
}

/// Render an outcome for display.
///
/// String responses are shown verbatim, anything else is pretty-printed.
pub fn present(outcome: &RelayOutcome) -> String {
    match outcome {
        RelayOutcome::Delivered(response) => {
            let text = match response {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
            };
            format!("Message sent successfully!\n\nServer Response:\n{}", text)
        }
        RelayOutcome::Failed(message) => format!(
            "Failed to send message.\n\nError:\n{}",
            message.as_deref().unwrap_or(UNKNOWN_ERROR)
        ),
    }
}

/// HTTP client for the relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    relay_url: String,
}

impl RelayClient {
    /// Create a client posting to `relay_url`.
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url: relay_url.into(),
        }
    }

    /// Submit once. No retry; the envelope is decoded whatever the status.
    #[instrument(skip_all, fields(relay_url = %self.relay_url))]
    pub async fn submit(&self, submission: &ContactSubmission) -> Result<RelayOutcome, ClientError> {
        let response = self
            .http
            .post(&self.relay_url)
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), size = bytes.len(), "relay replied");

        let envelope: RelayEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.into())
    }
}
