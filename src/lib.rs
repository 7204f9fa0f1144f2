//! Contact form relay.
//!
//! Serves a single-page contact form and relays its submissions to a fixed
//! upstream API, injecting a credential the browser never sees:
//!
//! ```text
//! browser ──POST /api/contact──▶ relay ──POST + x-api-key──▶ upstream
//!         ◀── {success, response} ──    ◀──────── body ──────
//! ```
//!
//! Every submission must carry `name`, `email`, `phone` and `message`.
//! Values are HTML-escaped before forwarding. Upstream failures, including
//! timeouts and non-2xx replies, are reported to the browser as failures.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`submission`]: Submission model and presence validation
//! - [`escape`]: HTML escaping
//! - [`upstream`]: Upstream API client
//! - [`api`]: HTTP routes for the page, relay, health, metrics and docs
//! - [`client`]: Command-line form client
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod escape;
pub mod metrics;
pub mod submission;
pub mod upstream;
pub mod utils;

pub use config::Config;
pub use error::RelayError;
pub use submission::ContactSubmission;
