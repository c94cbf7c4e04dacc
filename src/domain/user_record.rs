//! Durable user identity as returned by the identity store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user known to the identity store.
///
/// The email is the natural key; `id` is the store-assigned identifier
/// that documents are attributed to. The gateway never edits these fields,
/// it only maps connections onto records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Display name shown in typing indicators.
    pub fullname: String,
    /// Email address, unique per user.
    pub email: String,
}
