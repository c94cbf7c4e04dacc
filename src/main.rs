//! collab-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket and system endpoints.

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use collab_gateway::api;
use collab_gateway::app_state::AppState;
use collab_gateway::config::{GatewayConfig, LogFormat};
use collab_gateway::persistence::Stores;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(
        addr = %config.listen_addr,
        persistence = config.persistence_enabled,
        membership_events = config.emit_membership_events,
        "starting collab-gateway"
    );

    // Build persistence and application state
    let stores = Stores::from_config(&config)
        .await
        .context("failed to initialize persistence")?;
    let app_state = AppState::new(&config, stores);

    // Build router
    let app = api::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
