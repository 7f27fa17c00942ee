//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, AppState};

/// Build the `/api/v1` router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Volumes
        .route(
            "/projects/:project/forecasts/:forecast/volumes/count",
            get(handlers::count_volumes),
        )
        .route(
            "/projects/:project/forecasts/:forecast/volumes",
            get(handlers::get_volumes).head(handlers::head_volumes),
        )
        // Config
        .route("/config/reload", post(handlers::reload_config))
        .with_state(state)
}

/// Routes served outside the versioned prefix.
pub fn root_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .with_state(state)
}
