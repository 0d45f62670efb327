//! Persistence contract for phone-address records
//!
//! [`KvPhoneAddressRepository`] is the production implementation on top of
//! a [`pas_common::KeyValueStore`]; [`InMemoryPhoneAddressRepository`] is a
//! fake for exercising the service without a store.

use async_trait::async_trait;

use crate::error::RepositoryResult;
use crate::models::PhoneAddressRecord;

mod kv;
mod memory;

pub use kv::{record_key, KvPhoneAddressRepository, KEY_PREFIX};
pub use memory::InMemoryPhoneAddressRepository;

/// CRUD operations keyed by canonical phone number
///
/// Absence is reported as `None` / `false`, never as an error.
#[async_trait]
pub trait PhoneAddressRepository: Send + Sync {
    /// Fetch the record for `phone`
    async fn get(&self, phone: &str) -> RepositoryResult<Option<PhoneAddressRecord>>;

    /// Store a new record; `Duplicate` if the phone is already present
    async fn create(&self, record: PhoneAddressRecord) -> RepositoryResult<PhoneAddressRecord>;

    /// Replace the address of an existing record, refreshing `updated_at`
    async fn update(
        &self,
        phone: &str,
        address: &str,
    ) -> RepositoryResult<Option<PhoneAddressRecord>>;

    /// Remove the record; `true` if one was removed
    async fn delete(&self, phone: &str) -> RepositoryResult<bool>;

    /// Check presence without reading the record
    async fn exists(&self, phone: &str) -> RepositoryResult<bool>;
}
