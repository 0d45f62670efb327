//! In-process key-value store
//!
//! Backs tests and local experiments. Faults can be injected to exercise
//! the error paths of the layers above.

use super::{KeyValueStore, KvError, KvResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Failure mode applied to every subsequent operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every operation fails as if the store were unreachable
    Unavailable,
    /// Every operation fails with a store-reported error
    Backend,
    /// Reads work, writes are answered with a negative acknowledgment;
    /// conditional inserts, which have no such answer, fail as backend errors
    RejectWrites,
}

/// HashMap-backed store
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
    fault: RwLock<Option<Fault>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or clear, with `None`) the active fault
    pub async fn inject_fault(&self, fault: Option<Fault>) {
        *self.fault.write().await = fault;
    }

    /// Write a raw value, bypassing faults
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Read a raw value, bypassing faults
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn check(&self, write: bool) -> KvResult<bool> {
        match *self.fault.read().await {
            Some(Fault::Unavailable) => Err(KvError::Unavailable(
                "connection refused (injected)".to_string(),
            )),
            Some(Fault::Backend) => Err(KvError::Backend("backend failure (injected)".to_string())),
            Some(Fault::RejectWrites) if write => Ok(false),
            _ => Ok(true),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.check(false).await?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<bool> {
        if !self.check(true).await? {
            return Ok(false);
        }
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> KvResult<bool> {
        if !self.check(true).await? {
            return Err(KvError::Backend("write not acknowledged (injected)".to_string()));
        }
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        self.check(false).await?;
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        self.check(false).await?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn ping(&self) -> KvResult<()> {
        self.check(false).await.map(|_| ())
    }

    async fn close(&self) {}
}
