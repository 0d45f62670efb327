//! Phone address service
//!
//! Validates input, applies the business rules and delegates to the
//! repository. Handlers call this and nothing below it.
//!
//! Every public operation emits exactly one audit event carrying
//! `correlation_id`, `operation`, `phone` and `outcome`, plus `found` on
//! success or `error_kind` / `error` on failure. Other systems audit on
//! these events, so their shape is part of the contract.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::correlation::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{validate_address, validate_phone, PhoneAddressRecord};
use crate::repository::PhoneAddressRepository;

pub struct PhoneAddressService {
    repository: Arc<dyn PhoneAddressRepository>,
}

impl PhoneAddressService {
    pub fn new(repository: Arc<dyn PhoneAddressRepository>) -> Self {
        Self { repository }
    }

    /// Look up the record for `phone`; `None` if unknown
    pub async fn get_address(
        &self,
        ctx: &RequestContext,
        phone: &str,
    ) -> ServiceResult<Option<PhoneAddressRecord>> {
        let result = self.fetch(phone).await;

        audit(ctx, "get_address", phone, result.as_ref().map(Option::is_some));
        result
    }

    /// Register a new phone with its address; `Duplicate` if already present
    pub async fn create_record(
        &self,
        ctx: &RequestContext,
        phone: &str,
        address: &str,
    ) -> ServiceResult<PhoneAddressRecord> {
        let result = self.insert(phone, address).await;

        audit(ctx, "create_record", phone, result.as_ref().map(|_| true));
        result
    }

    /// Replace the address of a known phone; `None` if unknown
    pub async fn update_address(
        &self,
        ctx: &RequestContext,
        phone: &str,
        address: &str,
    ) -> ServiceResult<Option<PhoneAddressRecord>> {
        let result = self.replace_address(phone, address).await;

        audit(ctx, "update_address", phone, result.as_ref().map(Option::is_some));
        result
    }

    /// Remove the record for `phone`; `false` if there was none
    pub async fn delete_record(&self, ctx: &RequestContext, phone: &str) -> ServiceResult<bool> {
        let result = self.remove(phone).await;

        audit(ctx, "delete_record", phone, result.as_ref().copied());
        result
    }

    async fn fetch(&self, phone: &str) -> ServiceResult<Option<PhoneAddressRecord>> {
        let phone = validate_phone(phone)?;
        Ok(self.repository.get(&phone).await?)
    }

    async fn insert(&self, phone: &str, address: &str) -> ServiceResult<PhoneAddressRecord> {
        let record = PhoneAddressRecord::new(phone, address)?;
        Ok(self.repository.create(record).await?)
    }

    async fn replace_address(
        &self,
        phone: &str,
        address: &str,
    ) -> ServiceResult<Option<PhoneAddressRecord>> {
        let phone = validate_phone(phone)?;
        let address = validate_address(address)?;
        Ok(self.repository.update(&phone, &address).await?)
    }

    async fn remove(&self, phone: &str) -> ServiceResult<bool> {
        let phone = validate_phone(phone)?;
        Ok(self.repository.delete(&phone).await?)
    }
}

/// Emit the single audit event for one service call
fn audit(
    ctx: &RequestContext,
    operation: &'static str,
    phone: &str,
    result: Result<bool, &ServiceError>,
) {
    let correlation_id = ctx.correlation_id();
    let phone = phone.trim();

    match result {
        Ok(found) => info!(
            correlation_id = %correlation_id,
            operation,
            phone,
            outcome = "success",
            found,
            "Operation succeeded"
        ),
        Err(err) if err.is_client_error() => warn!(
            correlation_id = %correlation_id,
            operation,
            phone,
            outcome = "failure",
            error_kind = err.kind(),
            error = %err,
            "Operation rejected"
        ),
        Err(err) => error!(
            correlation_id = %correlation_id,
            operation,
            phone,
            outcome = "failure",
            error_kind = err.kind(),
            error = %err,
            "Operation failed"
        ),
    }
}
