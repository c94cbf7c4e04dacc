//! Connection-to-user identity mapping.
//!
//! [`IdentityDirectory`] resolves a `(fullname, email)` claim to a durable
//! [`UserRecord`] through the [`UserStore`] and remembers which record each
//! live [`ConnectionId`] currently speaks for. The mapping lives in memory
//! only and is rebuilt from scratch after a restart.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use validator::Validate;

use super::{ConnectionId, UserRecord};
use crate::error::GatewayError;
use crate::persistence::UserStore;

/// Normalized registration claim.
#[derive(Debug, Validate)]
struct IdentityClaim {
    #[validate(length(min = 1, max = 200, message = "fullname must be 1-200 characters"))]
    fullname: String,
    #[validate(email(message = "email is malformed"))]
    email: String,
}

impl IdentityClaim {
    fn parse(fullname: &str, email: &str) -> Result<Self, GatewayError> {
        let claim = Self {
            fullname: fullname.trim().to_string(),
            email: email.trim().to_lowercase(),
        };
        claim
            .validate()
            .map_err(|e| GatewayError::IdentityResolution(e.to_string()))?;
        Ok(claim)
    }
}

/// Directory of connection identities.
///
/// Each live connection maps to at most one user. Mapping the same
/// connection again overwrites the previous entry (last write wins); the
/// entry is dropped when the connection disconnects.
#[derive(Debug)]
pub struct IdentityDirectory {
    users: Arc<dyn UserStore>,
    mappings: RwLock<HashMap<ConnectionId, UserRecord>>,
}

impl IdentityDirectory {
    /// Creates an empty directory backed by `users`.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            mappings: RwLock::new(HashMap::new()),
        }
    }

    /// Looks up or creates the user for `(fullname, email)` and maps
    /// `connection` to it.
    ///
    /// Calling this twice with identical inputs yields the same record and
    /// leaves the mapping unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::IdentityResolution`] if the fullname is blank
    /// or the email is malformed, and [`GatewayError::Persistence`] if the
    /// identity store fails.
    pub async fn map_connection_to_user(
        &self,
        fullname: &str,
        email: &str,
        connection: ConnectionId,
    ) -> Result<UserRecord, GatewayError> {
        let claim = IdentityClaim::parse(fullname, email)?;
        let user = self
            .users
            .find_or_create_user(&claim.fullname, &claim.email)
            .await?;

        let previous = self.mappings.write().insert(connection, user.clone());
        match previous {
            Some(prev) if prev.id == user.id => {}
            Some(prev) => tracing::debug!(
                %connection,
                from = %prev.id,
                to = %user.id,
                "connection remapped to another user"
            ),
            None => tracing::debug!(%connection, user_id = %user.id, "connection mapped"),
        }

        Ok(user)
    }

    /// Returns the user currently mapped to `connection`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnmappedConnection`] if the connection has
    /// not registered an identity yet.
    pub fn resolve_user_for_connection(
        &self,
        connection: ConnectionId,
    ) -> Result<UserRecord, GatewayError> {
        self.mappings
            .read()
            .get(&connection)
            .cloned()
            .ok_or(GatewayError::UnmappedConnection(connection))
    }

    /// Drops the mapping for a disconnected connection.
    pub fn forget(&self, connection: ConnectionId) -> Option<UserRecord> {
        self.mappings.write().remove(&connection)
    }

    /// Returns the number of mapped connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    /// Returns `true` if no connection is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;

    fn make_directory() -> IdentityDirectory {
        IdentityDirectory::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn resolve_returns_mapped_user() {
        let dir = make_directory();
        let conn = ConnectionId::new();
        let Ok(user) = dir.map_connection_to_user("Alice", "a@x.com", conn).await else {
            panic!("mapping failed");
        };
        let Ok(resolved) = dir.resolve_user_for_connection(conn) else {
            panic!("resolve failed");
        };
        assert_eq!(resolved, user);
        assert_eq!(resolved.fullname, "Alice");
    }

    #[tokio::test]
    async fn unmapped_connection_fails() {
        let dir = make_directory();
        let result = dir.resolve_user_for_connection(ConnectionId::new());
        assert!(matches!(result, Err(GatewayError::UnmappedConnection(_))));
    }

    #[tokio::test]
    async fn mapping_is_idempotent() {
        let dir = make_directory();
        let conn = ConnectionId::new();
        let Ok(first) = dir.map_connection_to_user("Alice", "a@x.com", conn).await else {
            panic!("mapping failed");
        };
        let Ok(second) = dir.map_connection_to_user("Alice", "a@x.com", conn).await else {
            panic!("mapping failed");
        };
        assert_eq!(first, second);
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let dir = make_directory();
        let conn = ConnectionId::new();
        let claims = [
            ("Alice", "a@x.com"),
            ("Bob", "b@x.com"),
            ("Carol", "c@x.com"),
            ("Alice", "a@x.com"),
            ("Bob", "b@x.com"),
        ];
        for (fullname, email) in claims {
            let Ok(user) = dir.map_connection_to_user(fullname, email, conn).await else {
                panic!("mapping failed");
            };
            let Ok(resolved) = dir.resolve_user_for_connection(conn) else {
                panic!("resolve failed");
            };
            assert_eq!(resolved, user);
            assert_eq!(resolved.email, email);
        }
    }

    #[tokio::test]
    async fn email_is_normalized() {
        let dir = make_directory();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let Ok(first) = dir.map_connection_to_user("Alice", "A@X.com ", a).await else {
            panic!("mapping failed");
        };
        let Ok(second) = dir.map_connection_to_user(" Alice", "a@x.com", b).await else {
            panic!("mapping failed");
        };
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn rejects_blank_fullname() {
        let dir = make_directory();
        let result = dir
            .map_connection_to_user("   ", "a@x.com", ConnectionId::new())
            .await;
        assert!(matches!(result, Err(GatewayError::IdentityResolution(_))));
        assert!(dir.is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_email() {
        let dir = make_directory();
        for email in ["", "alice", "alice@", "@x.com"] {
            let result = dir
                .map_connection_to_user("Alice", email, ConnectionId::new())
                .await;
            assert!(
                matches!(result, Err(GatewayError::IdentityResolution(_))),
                "accepted {email:?}"
            );
        }
    }

    #[tokio::test]
    async fn forget_removes_mapping() {
        let dir = make_directory();
        let conn = ConnectionId::new();
        let _ = dir.map_connection_to_user("Alice", "a@x.com", conn).await;
        assert!(dir.forget(conn).is_some());
        assert!(dir.resolve_user_for_connection(conn).is_err());
        assert!(dir.forget(conn).is_none());
    }
}
