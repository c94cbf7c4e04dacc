//! WebSocket layer: connection handling and inbound message parsing.
//!
//! The WebSocket endpoint at `/ws` carries every session event in both
//! directions as `{"event", "data"}` JSON frames.

pub mod connection;
pub mod handler;
pub mod messages;
