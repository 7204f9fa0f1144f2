//! Client for the upstream contact API.

use std::fmt;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::metrics;
use crate::submission::EscapedSubmission;

/// Header carrying the upstream credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Successful upstream reply.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    /// HTTP status returned by the upstream.
    pub status: u16,
    /// Decoded body: JSON when the upstream sent JSON, a string otherwise.
    pub body: Value,
}

/// HTTP client bound to the configured upstream endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    /// HTTP client for upstream requests.
    http: reqwest::Client,
    /// Fixed upstream URL.
    url: String,
    /// Secret credential.
    api_key: String,
    /// Largest reply body that will be buffered.
    max_body: usize,
    /// Treat non-2xx replies as success.
    mask_errors: bool,
}

impl UpstreamClient {
    /// Create a client from config with the configured timeouts.
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .connect_timeout(config.upstream_connect_timeout())
            .build()?;

        Ok(Self {
            http,
            url: config.upstream_url.clone(),
            api_key: config.upstream_api_key.clone(),
            max_body: config.max_upstream_body_bytes,
            mask_errors: config.mask_upstream_errors,
        })
    }

    /// Forward an escaped submission.
    ///
    /// Exactly one POST is issued. Timeouts and transport failures are
    /// errors; a non-2xx status is [`UpstreamError::Rejected`] unless error
    /// masking is enabled, in which case the reply is returned as-is.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn forward(&self, submission: &EscapedSubmission) -> Result<UpstreamReply, UpstreamError> {
        let timer = metrics::timer_upstream();

        let result = self.send(submission).await;
        match &result {
            Ok(reply) => debug!(
                status = reply.status,
                latency_ms = timer.elapsed_ms(),
                "upstream replied"
            ),
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    error = %e,
                    latency_ms = timer.elapsed_ms(),
                    "upstream forward failed"
                );
                metrics::inc_upstream_failures(e.kind());
            }
        }
        result
    }

    async fn send(&self, submission: &EscapedSubmission) -> Result<UpstreamReply, UpstreamError> {
        let mut response = self
            .http
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        let bytes = self.read_body(&mut response).await?;
        let body = decode_body(&bytes);

        if status.is_success() || self.mask_errors {
            Ok(UpstreamReply {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Buffer the reply body, failing once it grows past `max_body`.
    async fn read_body(&self, response: &mut reqwest::Response) -> Result<Vec<u8>, UpstreamError> {
        let too_large = UpstreamError::BodyTooLarge { limit: self.max_body };

        if response.content_length().is_some_and(|len| len > self.max_body as u64) {
            return Err(too_large);
        }

        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if buf.len() + chunk.len() > self.max_body {
                return Err(too_large);
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("max_body", &self.max_body)
            .field("mask_errors", &self.mask_errors)
            .finish()
    }
}

/// Decode an upstream body: JSON if it parses, otherwise the raw text.
pub fn decode_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
