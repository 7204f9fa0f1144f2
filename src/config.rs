//! Application configuration loaded from environment variables.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Paths served by the relay itself.
const RESERVED_PATHS: &[&str] = &["/health", "/metrics", "/api-docs/openapi.json"];

/// Application configuration loaded from environment variables.
#[derive(Clone, Deserialize)]
pub struct Config {
    // === Upstream ===
    /// Fixed endpoint every submission is forwarded to.
    pub upstream_url: String,

    /// Secret sent as `x-api-key`. Never exposed to the browser.
    pub upstream_api_key: String,

    /// Whole-request timeout for the upstream call.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,

    /// Connect timeout for the upstream call.
    #[serde(default = "default_connect_timeout")]
    pub upstream_connect_timeout_ms: u64,

    /// Largest upstream reply body the relay will buffer.
    #[serde(default = "default_max_upstream_body")]
    pub max_upstream_body_bytes: usize,

    /// Legacy mode: report every upstream reply as success, whatever its status.
    #[serde(default)]
    pub mask_upstream_errors: bool,

    // === Server Configuration ===
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the JSON relay endpoint.
    #[serde(default = "default_relay_path")]
    pub relay_path: String,

    /// Largest submission body accepted on the relay path.
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,

    /// Allowed CORS origin, if the page is served from elsewhere.
    #[serde(default)]
    pub cors_allow_origin: Option<String>,
}

fn default_upstream_timeout() -> u64 {
    10_000
}

fn default_connect_timeout() -> u64 {
    2_000
}

fn default_max_upstream_body() -> usize {
    1024 * 1024
}

fn default_max_body() -> usize {
    64 * 1024
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_relay_path() -> String {
    "/api/contact".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a config for the given upstream with every other field defaulted.
    pub fn for_upstream(upstream_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            upstream_api_key: api_key.into(),
            upstream_timeout_ms: default_upstream_timeout(),
            upstream_connect_timeout_ms: default_connect_timeout(),
            max_upstream_body_bytes: default_max_upstream_body(),
            mask_upstream_errors: false,
            host: default_host(),
            port: default_port(),
            relay_path: default_relay_path(),
            max_body_bytes: default_max_body(),
            cors_allow_origin: None,
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.upstream_api_key.trim().is_empty() {
            return Err("UPSTREAM_API_KEY is required".to_string());
        }

        let url = Url::parse(&self.upstream_url)
            .map_err(|e| format!("UPSTREAM_URL is not a valid URL: {}", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("UPSTREAM_URL must use http or https".to_string());
        }

        if !self.relay_path.starts_with('/') || self.relay_path == "/" {
            return Err("RELAY_PATH must start with / and must not be the root".to_string());
        }

        if self.relay_path.contains([':', '*', '{', '}']) {
            return Err("RELAY_PATH must be a literal path".to_string());
        }

        if RESERVED_PATHS.contains(&self.relay_path.as_str()) || self.relay_path.starts_with("/docs") {
            return Err(format!("RELAY_PATH {} is reserved", self.relay_path));
        }

        if self.upstream_timeout_ms == 0 {
            return Err("UPSTREAM_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.upstream_connect_timeout_ms == 0 {
            return Err("UPSTREAM_CONNECT_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.max_body_bytes == 0 || self.max_upstream_body_bytes == 0 {
            return Err("MAX_BODY_BYTES and MAX_UPSTREAM_BODY_BYTES must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Upstream request timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Upstream connect timeout.
    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_connect_timeout_ms)
    }

    /// `host:port` the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// The API key must never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("upstream_url", &self.upstream_url)
            .field("upstream_api_key", &"<redacted>")
            .field("upstream_timeout_ms", &self.upstream_timeout_ms)
            .field("upstream_connect_timeout_ms", &self.upstream_connect_timeout_ms)
            .field("max_upstream_body_bytes", &self.max_upstream_body_bytes)
            .field("mask_upstream_errors", &self.mask_upstream_errors)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("relay_path", &self.relay_path)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("cors_allow_origin", &self.cors_allow_origin)
            .finish()
    }
}
