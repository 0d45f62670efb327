//! In-memory repository fake
//!
//! Same semantics as the store-backed repository, without serialization or
//! store faults. Service tests run against it.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::PhoneAddressRepository;
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::PhoneAddressRecord;

#[derive(Debug, Default)]
pub struct InMemoryPhoneAddressRepository {
    records: RwLock<HashMap<String, PhoneAddressRecord>>,
}

impl InMemoryPhoneAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl PhoneAddressRepository for InMemoryPhoneAddressRepository {
    async fn get(&self, phone: &str) -> RepositoryResult<Option<PhoneAddressRecord>> {
        Ok(self.records.read().await.get(phone).cloned())
    }

    async fn create(&self, record: PhoneAddressRecord) -> RepositoryResult<PhoneAddressRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(record.phone()) {
            return Err(RepositoryError::Duplicate(record.phone().to_string()));
        }
        records.insert(record.phone().to_string(), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        phone: &str,
        address: &str,
    ) -> RepositoryResult<Option<PhoneAddressRecord>> {
        let mut records = self.records.write().await;
        let Some(existing) = records.get_mut(phone) else {
            return Ok(None);
        };
        *existing = existing.with_address(address.to_string(), Utc::now());
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, phone: &str) -> RepositoryResult<bool> {
        Ok(self.records.write().await.remove(phone).is_some())
    }

    async fn exists(&self, phone: &str) -> RepositoryResult<bool> {
        Ok(self.records.read().await.contains_key(phone))
    }
}
