//! In-memory implementation of both stores.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{DocumentStore, UserStore};
use crate::domain::{DocumentRecord, StoredDocument, UserRecord};
use crate::error::GatewayError;

/// Process-local store keyed by email for users and by id for documents.
///
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
    documents: RwLock<HashMap<Uuid, StoredDocument>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of known users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Returns a stored document by id.
    #[must_use]
    pub fn document(&self, id: Uuid) -> Option<StoredDocument> {
        self.documents.read().get(&id).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_or_create_user(
        &self,
        fullname: &str,
        email: &str,
    ) -> Result<UserRecord, GatewayError> {
        let mut users = self.users.write();
        let user = users.entry(email.to_string()).or_insert_with(|| {
            tracing::debug!(email, "creating user");
            UserRecord {
                id: Uuid::new_v4(),
                fullname: fullname.to_string(),
                email: email.to_string(),
            }
        });
        Ok(user.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_document(
        &self,
        record: &DocumentRecord,
    ) -> Result<StoredDocument, GatewayError> {
        let stored = StoredDocument::from_record(record);
        self.documents.write().insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_email_returns_same_user() {
        let store = InMemoryStore::new();
        let Ok(first) = store.find_or_create_user("Alice", "a@x.com").await else {
            panic!("create failed");
        };
        let Ok(second) = store.find_or_create_user("Alice", "a@x.com").await else {
            panic!("lookup failed");
        };
        assert_eq!(first, second);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn existing_record_is_not_renamed() {
        let store = InMemoryStore::new();
        let _ = store.find_or_create_user("Alice", "a@x.com").await;
        let Ok(user) = store.find_or_create_user("Ally", "a@x.com").await else {
            panic!("lookup failed");
        };
        assert_eq!(user.fullname, "Alice");
    }

    #[tokio::test]
    async fn create_document_assigns_id() {
        let store = InMemoryStore::new();
        let record = DocumentRecord {
            title: "T".to_string(),
            content: "C".to_string(),
            user_id: Uuid::new_v4(),
        };
        let Ok(stored) = store.create_document(&record).await else {
            panic!("create failed");
        };
        assert_eq!(stored.title, "T");
        assert_eq!(stored.user_id, record.user_id);
        assert_eq!(store.document(stored.id), Some(stored));
    }
}
