//! # Key-Value Store
//!
//! The persistence seam used by the pricing layer.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    dyn KeyValueStore                                    │
//! │                                                                         │
//! │  ┌──────────────────────────┐      ┌──────────────────────────┐        │
//! │  │     SqliteKvStore        │      │     MemoryKvStore        │        │
//! │  │  kv_store table (upsert) │      │  RwLock<HashMap>         │        │
//! │  │  survives restarts       │      │  fail switch for tests   │        │
//! │  └──────────────────────────┘      └──────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are opaque strings. Every key is independent: there are no
//! multi-key transactions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};

/// String key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, `None` when the key was never written or was removed.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local store.
///
/// `set_failing(true)` makes every operation return
/// [`StoreError::Unavailable`] until switched back.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryKvStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the backing storage becoming unavailable (or recovering).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_available()?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_available()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.check_available()?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
