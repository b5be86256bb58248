//! Route definitions for the API.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;

use super::handlers;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/publish", put(handlers::publish::publish))
        .route(
            "/api/v1/projects/:group/:artifact",
            get(handlers::catalog::get_project),
        )
        .route(
            "/api/v1/projects/:group/:artifact/releases",
            get(handlers::catalog::list_releases),
        )
        .route("/api/v1/catalog/summary", get(handlers::catalog::summary))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024)) // 16 MB, POMs are small
        .with_state(state)
}
