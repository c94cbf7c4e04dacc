//! # collab-gateway
//!
//! WebSocket session gateway for real-time collaborative document editing.
//!
//! Clients join named rooms, exchange chat messages, see each other's
//! typing status, receive live document edits, and save finished
//! documents. The gateway maps short-lived connection handles onto durable
//! users and routes every outbound event to the right set of connections.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)          System endpoints (api/)
//!     │
//!     ├── SessionService (service/)
//!     │
//!     ├── IdentityDirectory (domain/)
//!     ├── RoomRouter (domain/)
//!     │
//!     └── UserStore / DocumentStore (persistence/)
//!             ├── InMemoryStore
//!             └── PostgresStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
