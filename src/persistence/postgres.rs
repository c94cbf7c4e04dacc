//! PostgreSQL implementation of both stores.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{DocumentStore, UserStore};
use crate::config::GatewayConfig;
use crate::domain::{DocumentRecord, StoredDocument, UserRecord};
use crate::error::GatewayError;

/// PostgreSQL-backed stores using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from the configuration and applies the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_or_create_user(
        &self,
        fullname: &str,
        email: &str,
    ) -> Result<UserRecord, GatewayError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let (id, fullname, email) = sqlx::query_as::<_, (Uuid, String, String)>(
            "INSERT INTO users (id, fullname, email) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
             RETURNING id, fullname, email",
        )
        .bind(Uuid::new_v4())
        .bind(fullname)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(UserRecord {
            id,
            fullname,
            email,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn create_document(
        &self,
        record: &DocumentRecord,
    ) -> Result<StoredDocument, GatewayError> {
        let (id, title, content, user_id, created_at) =
            sqlx::query_as::<_, (Uuid, String, String, Uuid, DateTime<Utc>)>(
                "INSERT INTO documents (id, title, content, user_id) VALUES ($1, $2, $3, $4) \
                 RETURNING id, title, content, user_id, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(&record.title)
            .bind(&record.content)
            .bind(record.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(StoredDocument {
            id,
            title,
            content,
            user_id,
            created_at,
        })
    }
}
