//! Key-value store abstraction
//!
//! The store is the only shared mutable state of the service. Every
//! operation touches a single key and is atomic at the store.

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::{Fault, MemoryKvStore};
pub use sqlite::SqliteKvStore;

/// Result type for store operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Store-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// Connectivity failure or timeout; transient, safe for a caller to retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other fault reported by the store
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl KvError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, KvError::Unavailable(_))
    }
}

/// Minimal key-value contract used by the repository layer
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// Returns the store's write acknowledgment: `false` means the store
    /// accepted the request but did not persist the value.
    async fn set(&self, key: &str, value: &str) -> KvResult<bool>;

    /// Store `value` under `key` only if the key is absent
    ///
    /// Returns `true` if the value was written, `false` if the key already
    /// existed. The check and the write are one atomic step.
    async fn set_if_absent(&self, key: &str, value: &str) -> KvResult<bool>;

    /// Check whether `key` is present without fetching its value
    async fn exists(&self, key: &str) -> KvResult<bool>;

    /// Remove `key`; returns `true` if a key was actually removed
    async fn delete(&self, key: &str) -> KvResult<bool>;

    /// Connectivity probe; never mutates state
    async fn ping(&self) -> KvResult<()>;

    /// Release pooled connections; called once at shutdown
    async fn close(&self);
}
