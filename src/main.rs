mod api;
mod config;
mod db;
mod error;
mod services;
mod state;

#[cfg(test)]
mod test_helpers;

use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statusdeck=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StatusDeck v{}", env!("CARGO_PKG_VERSION"));

    // Connect to the database and apply the schema
    let conn = db::connect().await?;
    tracing::info!("Database connection established");

    // Create app state
    let state = AppState::new(conn);

    // Build the application
    let app = create_app(state);

    // Determine bind address
    let addr = SocketAddr::new(CONFIG.host.parse()?, CONFIG.port);
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
