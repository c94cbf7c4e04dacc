//! System endpoints: health check and event catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::OUTBOUND_EVENTS;
use crate::ws::messages::INBOUND_EVENTS;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    connections: usize,
    rooms: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp, and the number of live WebSocket connections and non-empty rooms.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let router = state.session_service.router();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections: router.connection_count(),
            rooms: router.room_count(),
        }),
    )
}

/// WebSocket event catalog.
#[derive(Debug, Serialize, ToSchema)]
struct EventCatalog {
    inbound: Vec<String>,
    outbound: Vec<String>,
}

/// `GET /config/events` — List WebSocket event names.
#[utoipa::path(
    get,
    path = "/config/events",
    tag = "System",
    summary = "List WebSocket events",
    description = "Returns the event names accepted on `/ws` and the event names the gateway emits.",
    responses(
        (status = 200, description = "Event catalog", body = EventCatalog),
    )
)]
pub async fn events_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(EventCatalog {
            inbound: INBOUND_EVENTS.iter().map(|e| (*e).to_string()).collect(),
            outbound: OUTBOUND_EVENTS.iter().map(|e| (*e).to_string()).collect(),
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/events", get(events_handler))
}
