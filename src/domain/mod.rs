//! Domain layer: connection identity, rooms, and session events.
//!
//! This module contains the session coordination core: the connection
//! handle type, user and document records, the identity directory that
//! maps connections onto users, and the room router that fans outbound
//! events out to the right connections.

pub mod connection_id;
pub mod document;
pub mod identity_directory;
pub mod room_router;
pub mod session_event;
pub mod user_record;

pub use connection_id::ConnectionId;
pub use document::{DocumentRecord, StoredDocument};
pub use identity_directory::IdentityDirectory;
pub use room_router::{OutboundSender, RoomRouter};
pub use session_event::{OUTBOUND_EVENTS, SessionEvent, TextStyle};
pub use user_record::UserRecord;
