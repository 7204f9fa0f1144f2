//! Unified error types for the contact relay.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::handlers::RelayFailure;
use crate::submission::SubmissionField;

/// Message returned to the browser for every validation failure.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input";

/// Unified error type for the contact relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Submission rejected before forwarding.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Upstream call failed.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Reasons a submission body is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Body could not be read, e.g. it exceeds the size limit.
    #[error("request body could not be read: {0}")]
    UnreadableBody(String),

    /// Body is not a JSON object.
    #[error("request body is not a JSON object")]
    MalformedBody,

    /// A required field is absent or null.
    #[error("missing field: {0}")]
    MissingField(SubmissionField),

    /// A field holds a value that cannot be treated as text.
    #[error("field {0} has an unsupported type")]
    InvalidFieldType(SubmissionField),
}

/// Failures of the upstream forward.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Upstream did not answer within the configured timeout.
    #[error("upstream timed out")]
    Timeout,

    /// Connection or protocol failure.
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Upstream reply body exceeds the configured limit.
    #[error("upstream reply exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Rejected {
        /// Status code returned by the upstream.
        status: u16,
        /// Body returned by the upstream.
        body: serde_json::Value,
    },
}

impl UpstreamError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::BodyTooLarge { .. } => "oversized",
            UpstreamError::Rejected { .. } => "rejected",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            // The URL may carry credentials; keep it out of client-visible text.
            UpstreamError::Transport(err.without_url())
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(RelayFailure::new(INVALID_INPUT_MESSAGE)),
        )
            .into_response()
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let status = match &self {
            UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Transport(_)
            | UpstreamError::BodyTooLarge { .. }
            | UpstreamError::Rejected { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(RelayFailure::new(self.to_string()))).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::Validation(e) => e.into_response(),
            RelayError::Upstream(e) => e.into_response(),
            RelayError::Invalid(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RelayFailure::new(self.to_string())),
            )
                .into_response(),
        }
    }
}
