//! HTTP API route definitions.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa_swagger_ui::SwaggerUi;

use super::docs::api_doc;
use super::handlers::{contact_page, health, metrics_text, submit_contact, AppState};

/// Create the API router.
///
/// The page and the JSON relay are separate routes; any method other than
/// POST on the relay path is answered with 405.
pub fn create_router(state: AppState) -> Router {
    let relay_path = state.relay_path.to_string();
    let cors_origin = state.cors_origin.clone();
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    let router = Router::new()
        // Form client
        .route("/", get(contact_page))
        // Relay endpoint
        .route(&relay_path, post(submit_contact).layer(body_limit))
        // Health and metrics
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", api_doc(&relay_path)))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        ),
        None => router,
    }
}
