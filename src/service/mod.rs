//! Service layer: session event handlers.
//!
//! [`SessionService`] validates identity through the
//! [`super::domain::IdentityDirectory`], delivers through the
//! [`super::domain::RoomRouter`], and persists through the
//! [`super::persistence::DocumentStore`].

pub mod session_service;

pub use session_service::SessionService;
