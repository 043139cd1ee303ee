//! # gloventra-store: Key-Value Persistence for Gloventra Pricing
//!
//! This crate stores the pricing layer's state outside process memory so
//! the chosen currency and the last rate snapshot survive restarts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Gloventra Pricing Data Flow                         │
//! │                                                                         │
//! │  PreferenceStore (gloventra-pricing)                                   │
//! │       │ get / set / remove                                             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  gloventra-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │   Database    │   │ KeyValueStore  │   │  Migrations   │   │   │
//! │  │   │   (pool.rs)   │   │   (kv.rs)      │   │  (embedded)   │   │   │
//! │  │   │               │   │                │   │               │   │   │
//! │  │   │ SqlitePool    │◄──│ SqliteKvStore  │   │ 001_kv_store  │   │   │
//! │  │   │               │   │ MemoryKvStore  │   │               │   │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (path from [storage] in pricing.toml)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`kv`] - The `KeyValueStore` trait and the in-memory store
//! - [`repository`] - SQLite-backed repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gloventra_store::{Database, DbConfig, KeyValueStore};
//!
//! let db = Database::new(DbConfig::new("path/to/gloventra.db")).await?;
//! let store = db.kv();
//! store.set("gloventra_currency", "EUR").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use kv::{KeyValueStore, MemoryKvStore};
pub use pool::{Database, DbConfig};
pub use repository::kv::SqliteKvStore;
