//! # SQLite Key-Value Repository
//!
//! [`KeyValueStore`] over the `kv_store` table.
//!
//! ## Statements
//! ```text
//! get    ──► SELECT value FROM kv_store WHERE key = ?1
//! set    ──► INSERT ... ON CONFLICT(key) DO UPDATE SET value, updated_at
//! remove ──► DELETE FROM kv_store WHERE key = ?1
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Repository for key-value entries.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Creates a new SqliteKvStore.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteKvStore { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        debug!(key = %key, bytes = value.len(), "Writing key");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        debug!(key = %key, "Removing key");

        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
