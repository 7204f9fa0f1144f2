//! OpenAPI document for the relay.

use utoipa::OpenApi;

use super::handlers::{RelayFailure, RelaySuccess};
use crate::submission::ContactSubmission;

/// Path the relay endpoint is documented under before relocation.
pub const DOCUMENTED_RELAY_PATH: &str = "/api/contact";

#[derive(OpenApi)]
#[openapi(
    info(title = "contact-relay", description = "Contact form relay API"),
    paths(super::handlers::submit_contact, super::handlers::health),
    components(schemas(ContactSubmission, RelaySuccess, RelayFailure))
)]
pub struct ApiDoc;

/// Build the OpenAPI document with the relay mounted at `relay_path`.
pub fn api_doc(relay_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if relay_path != DOCUMENTED_RELAY_PATH {
        if let Some(item) = doc.paths.paths.remove(DOCUMENTED_RELAY_PATH) {
            doc.paths.paths.insert(relay_path.to_string(), item);
        }
    }
    doc
}
