//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::persistence::Stores;
use crate::service::SessionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session service for all event handling.
    pub session_service: Arc<SessionService>,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
}

impl AppState {
    /// Wires the session service from the configuration and stores.
    #[must_use]
    pub fn new(config: &GatewayConfig, stores: Stores) -> Self {
        Self {
            session_service: Arc::new(SessionService::new(
                stores,
                config.emit_membership_events,
            )),
            outbound_buffer: config.outbound_buffer,
        }
    }
}
