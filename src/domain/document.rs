//! Document records submitted to and returned by the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document ready to be persisted, attributed to a resolved user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Document title.
    pub title: String,
    /// Full document body at save time.
    pub content: String,
    /// Owning user, taken from the identity mapping of the saving connection.
    pub user_id: Uuid,
}

/// A persisted document as acknowledged by `save-document-success`.
///
/// Serialized in camelCase to match what the browser client expects:
/// `{"id", "title", "content", "userId", "createdAt"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    /// Durable document identifier.
    pub id: Uuid,
    /// Document title.
    pub title: String,
    /// Document body.
    pub content: String,
    /// Owning user identifier.
    pub user_id: Uuid,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Stamps a [`DocumentRecord`] with a fresh identifier and the current
    /// time.
    #[must_use]
    pub fn from_record(record: &DocumentRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: record.title.clone(),
            content: record.content.clone(),
            user_id: record.user_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn stored_document_uses_camel_case() {
        let record = DocumentRecord {
            title: "T".to_string(),
            content: "C".to_string(),
            user_id: Uuid::new_v4(),
        };
        let stored = StoredDocument::from_record(&record);
        let Ok(json) = serde_json::to_value(&stored) else {
            panic!("serialization failed");
        };
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("user_id").is_none());
    }
}
