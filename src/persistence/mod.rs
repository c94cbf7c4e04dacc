//! Persistence layer: identity store and document store.
//!
//! The gateway talks to durable storage only through the [`UserStore`] and
//! [`DocumentStore`] traits. [`InMemoryStore`] backs both for local runs
//! and tests; [`PostgresStore`] backs both with `sqlx::PgPool` when
//! `PERSISTENCE_ENABLED` is set.

pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

use crate::config::GatewayConfig;
use crate::domain::{DocumentRecord, StoredDocument, UserRecord};
use crate::error::GatewayError;

/// Lookup-or-create access to durable user records.
#[async_trait]
pub trait UserStore: Send + Sync + fmt::Debug {
    /// Returns the user keyed by `email`, creating it with `fullname` when
    /// it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] when the store is unavailable.
    async fn find_or_create_user(
        &self,
        fullname: &str,
        email: &str,
    ) -> Result<UserRecord, GatewayError>;
}

/// Durable document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Persists `record` and returns the stored copy with its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] when the store is unavailable
    /// or rejects the write.
    async fn create_document(
        &self,
        record: &DocumentRecord,
    ) -> Result<StoredDocument, GatewayError>;
}

/// Store handles shared by the session service.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Identity store.
    pub users: Arc<dyn UserStore>,
    /// Document store.
    pub documents: Arc<dyn DocumentStore>,
}

impl Stores {
    /// Wraps a single backend that implements both store traits.
    #[must_use]
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: UserStore + DocumentStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            users: Arc::clone(&backend) as Arc<dyn UserStore>,
            documents: backend,
        }
    }

    /// Builds the stores selected by the configuration: PostgreSQL when
    /// persistence is enabled, in-memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] if the database cannot be
    /// reached or migrations fail.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        if config.persistence_enabled {
            let store = PostgresStore::connect(config).await?;
            tracing::info!("using postgres persistence");
            Ok(Self::from_backend(store))
        } else {
            tracing::info!("persistence disabled; using in-memory stores");
            Ok(Self::from_backend(InMemoryStore::new()))
        }
    }
}
