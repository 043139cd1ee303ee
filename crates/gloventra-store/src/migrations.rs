//! # Database Migrations
//!
//! Embedded SQL migrations for the SQLite key-value store.
//!
//! ## How Migrations Work
//! ```text
//! Database::new()
//!      │
//!      ▼
//! _sqlx_migrations exists? ── no ──► create it
//!      │
//!      ▼
//! 001_kv_store.sql applied? ── no ──► run in a transaction, record checksum
//!      │
//!      ▼
//! store ready
//! ```
//!
//! New migrations go in `migrations/sqlite/` as `NNN_description.sql`.
//! Existing files are never edited.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent: safe to run multiple times.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}
