//! Key-value store backed repository
//!
//! Layout: one key per phone, `phone:<phone>`, holding the JSON record.
//! Store failures are translated here and nowhere else.

use async_trait::async_trait;
use chrono::Utc;
use pas_common::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::PhoneAddressRepository;
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::PhoneAddressRecord;

/// Prefix shared by every record key
pub const KEY_PREFIX: &str = "phone:";

/// Store key for a canonical phone number
pub fn record_key(phone: &str) -> String {
    format!("{}{}", KEY_PREFIX, phone)
}

/// Production repository; holds the injected store handle
#[derive(Clone)]
pub struct KvPhoneAddressRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvPhoneAddressRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn encode(record: &PhoneAddressRecord) -> RepositoryResult<String> {
        record
            .to_json()
            .map_err(|e| RepositoryError::Store(format!("Cannot serialize record: {}", e)))
    }

    async fn write(&self, operation: &'static str, record: &PhoneAddressRecord) -> RepositoryResult<()> {
        let json = Self::encode(record)?;

        let acknowledged = self
            .store
            .set(&record_key(record.phone()), &json)
            .await
            .map_err(|e| log_store_error(operation, record.phone(), e.into()))?;

        if !acknowledged {
            error!(phone = record.phone(), operation, "Store did not acknowledge write");
            return Err(RepositoryError::Store(format!(
                "Failed to store record for {}",
                record.phone()
            )));
        }
        Ok(())
    }
}

fn log_store_error(operation: &'static str, phone: &str, err: RepositoryError) -> RepositoryError {
    match &err {
        RepositoryError::StoreUnavailable(_) => {
            warn!(phone, operation, error = %err, "Store unavailable")
        }
        _ => error!(phone, operation, error = %err, "Store error"),
    }
    err
}

#[async_trait]
impl PhoneAddressRepository for KvPhoneAddressRepository {
    async fn get(&self, phone: &str) -> RepositoryResult<Option<PhoneAddressRecord>> {
        let raw = self
            .store
            .get(&record_key(phone))
            .await
            .map_err(|e| log_store_error("get", phone, e.into()))?;

        let Some(raw) = raw else {
            debug!(phone, operation = "get", "Phone number not found");
            return Ok(None);
        };

        let record = PhoneAddressRecord::from_json(&raw).map_err(|reason| {
            error!(phone, operation = "get", error = %reason, "Failed to parse stored record");
            RepositoryError::CorruptData {
                phone: phone.to_string(),
                reason,
            }
        })?;

        if record.phone() != phone {
            error!(
                phone,
                stored_phone = record.phone(),
                operation = "get",
                "Stored record belongs to another phone"
            );
            return Err(RepositoryError::CorruptData {
                phone: phone.to_string(),
                reason: format!("record under key holds phone {}", record.phone()),
            });
        }

        debug!(phone, operation = "get", "Phone address record retrieved");
        Ok(Some(record))
    }

    async fn create(&self, record: PhoneAddressRecord) -> RepositoryResult<PhoneAddressRecord> {
        let json = Self::encode(&record)?;
        let inserted = self
            .store
            .set_if_absent(&record_key(record.phone()), &json)
            .await
            .map_err(|e| log_store_error("create", record.phone(), e.into()))?;

        if !inserted {
            warn!(phone = record.phone(), operation = "create", "Attempted to create duplicate phone record");
            return Err(RepositoryError::Duplicate(record.phone().to_string()));
        }
        debug!(phone = record.phone(), operation = "create", "Phone address record created");
        Ok(record)
    }

    async fn update(
        &self,
        phone: &str,
        address: &str,
    ) -> RepositoryResult<Option<PhoneAddressRecord>> {
        let Some(existing) = self.get(phone).await? else {
            debug!(phone, operation = "update", "Phone number not found for update");
            return Ok(None);
        };

        let updated = existing.with_address(address.to_string(), Utc::now());
        self.write("update", &updated).await?;

        debug!(phone, operation = "update", "Phone address record updated");
        Ok(Some(updated))
    }

    async fn delete(&self, phone: &str) -> RepositoryResult<bool> {
        let deleted = self
            .store
            .delete(&record_key(phone))
            .await
            .map_err(|e| log_store_error("delete", phone, e.into()))?;

        debug!(phone, operation = "delete", deleted, "Delete completed");
        Ok(deleted)
    }

    async fn exists(&self, phone: &str) -> RepositoryResult<bool> {
        let exists = self
            .store
            .exists(&record_key(phone))
            .await
            .map_err(|e| log_store_error("exists", phone, e.into()))?;

        debug!(phone, operation = "exists", exists, "Phone existence check");
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pas_common::kv::{Fault, MemoryKvStore};

    fn setup() -> (Arc<MemoryKvStore>, KvPhoneAddressRepository) {
        let store = Arc::new(MemoryKvStore::new());
        let repo = KvPhoneAddressRepository::new(store.clone());
        (store, repo)
    }

    fn sample() -> PhoneAddressRecord {
        PhoneAddressRecord::new("+1234567890", "123 Main St").unwrap()
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("+1234567890"), "phone:+1234567890");
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (store, repo) = setup();
        let record = sample();

        let created = repo.create(record.clone()).await.unwrap();
        assert_eq!(created, record);

        let stored = store.raw("phone:+1234567890").await.expect("key written");
        assert_eq!(PhoneAddressRecord::from_json(&stored).unwrap(), record);

        assert_eq!(repo.get("+1234567890").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_store, repo) = setup();
        assert_eq!(repo.get("+1234567890").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_duplicate_rejected() {
        let (_store, repo) = setup();
        repo.create(sample()).await.unwrap();

        let err = repo.create(sample()).await.unwrap_err();
        assert_eq!(err, RepositoryError::Duplicate("+1234567890".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_admit_one_winner() {
        let (store, repo) = setup();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let record =
                    PhoneAddressRecord::new("+1234567890", &format!("Address {}", i)).unwrap();
                repo.create(record).await
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(record) => winners.push(record),
                Err(err) => {
                    assert_eq!(err, RepositoryError::Duplicate("+1234567890".to_string()))
                }
            }
        }

        assert_eq!(winners.len(), 1);
        let stored = store.raw("phone:+1234567890").await.expect("key written");
        assert_eq!(PhoneAddressRecord::from_json(&stored).unwrap(), winners[0]);
    }

    #[tokio::test]
    async fn test_create_unacknowledged_write_is_store_error() {
        let (store, repo) = setup();
        store.inject_fault(Some(Fault::RejectWrites)).await;

        let err = repo.create(sample()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Store(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_get_corrupted_json() {
        let (store, repo) = setup();
        store.insert_raw("phone:+1234567890", "{not json").await;

        let err = repo.get("+1234567890").await.unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptData { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_get_record_under_wrong_key_is_corrupt() {
        let (store, repo) = setup();
        let other = PhoneAddressRecord::new("+19998887766", "Elsewhere").unwrap();
        store
            .insert_raw("phone:+1234567890", &other.to_json().unwrap())
            .await;

        let err = repo.get("+1234567890").await.unwrap_err();
        assert!(matches!(err, RepositoryError::CorruptData { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_existing_preserves_created_at() {
        let (_store, repo) = setup();
        let original = repo.create(sample()).await.unwrap();

        let updated = repo
            .update("+1234567890", "456 Oak Ave")
            .await
            .unwrap()
            .expect("record exists");

        assert_eq!(updated.phone(), "+1234567890");
        assert_eq!(updated.address(), "456 Oak Ave");
        assert_eq!(updated.created_at(), original.created_at());
        assert!(updated.updated_at() >= original.updated_at());
        assert_eq!(repo.get("+1234567890").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_is_none_and_writes_nothing() {
        let (store, repo) = setup();

        assert_eq!(repo.update("+1234567890", "Anywhere").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_unacknowledged_write_is_store_error() {
        let (store, repo) = setup();
        repo.create(sample()).await.unwrap();
        store.inject_fault(Some(Fault::RejectWrites)).await;

        let err = repo.update("+1234567890", "New").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Store(_)), "got {:?}", err);
        assert_eq!(
            repo.get("+1234567890").await.unwrap().unwrap().address(),
            "123 Main St"
        );
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let (_store, repo) = setup();
        repo.create(sample()).await.unwrap();

        assert!(repo.exists("+1234567890").await.unwrap());
        assert!(repo.delete("+1234567890").await.unwrap());
        assert!(!repo.exists("+1234567890").await.unwrap());
        assert!(!repo.delete("+1234567890").await.unwrap());
        assert_eq!(repo.get("+1234567890").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unavailable_store_maps_every_operation() {
        let (store, repo) = setup();
        store.inject_fault(Some(Fault::Unavailable)).await;

        assert!(matches!(repo.get("+1234567890").await, Err(RepositoryError::StoreUnavailable(_))));
        assert!(matches!(repo.create(sample()).await, Err(RepositoryError::StoreUnavailable(_))));
        assert!(matches!(repo.update("+1234567890", "x").await, Err(RepositoryError::StoreUnavailable(_))));
        assert!(matches!(repo.delete("+1234567890").await, Err(RepositoryError::StoreUnavailable(_))));
        assert!(matches!(repo.exists("+1234567890").await, Err(RepositoryError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_backend_failure_is_store_error() {
        let (store, repo) = setup();
        store.inject_fault(Some(Fault::Backend)).await;

        assert!(matches!(repo.get("+1234567890").await, Err(RepositoryError::Store(_))));
        assert!(matches!(repo.delete("+1234567890").await, Err(RepositoryError::Store(_))));
    }
}
