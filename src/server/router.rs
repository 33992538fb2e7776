//! Router builder utilities for endpoint routes

use crate::endpoints::handlers::{AppState, get_endpoint, get_scripts, list_endpoints};
use axum::{Router, routing::get};

/// Build the read-only endpoint routes
///
/// These routes are generic and serve every registered endpoint:
/// - GET /api - List registered endpoints
/// - GET /api/{version}/{*path} - Serve an endpoint
/// - GET /scripts/{version} - Script whitelist of an API version
pub fn build_endpoint_routes(state: AppState) -> Router {
    Router::new()
        .route("/api", get(list_endpoints))
        .route("/api/{version}/{*path}", get(get_endpoint))
        .route("/scripts/{version}", get(get_scripts))
        .with_state(state)
}
