pub mod auth;
pub mod components;
pub mod extractors;
pub mod incidents;
pub mod pages;

use axum::Router;

use crate::config::CONFIG;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let page_routes = pages::pages_routes(state.clone())
        .merge(components::components_routes(state.clone()))
        .merge(incidents::incidents_routes(state.clone()));

    Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/version", axum::routing::get(get_version))
        .nest("/pages/", page_routes)
        .merge(auth::auth_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": CONFIG.version,
        "backend": "rust"
    }))
}
