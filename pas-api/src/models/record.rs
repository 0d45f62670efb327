//! Phone-address record entity and request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_address, validate_phone, ValidationError};

/// A phone number and the address associated with it
///
/// The phone is the identity and never changes after creation.
/// `updated_at` is never earlier than `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneAddressRecord {
    phone: String,
    address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PhoneAddressRecord {
    /// Build a new record from raw input, stamping both timestamps with now
    pub fn new(phone: &str, address: &str) -> Result<Self, ValidationError> {
        let phone = validate_phone(phone)?;
        let address = validate_address(address)?;
        let now = Utc::now();
        Ok(Self {
            phone,
            address,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Copy of this record with a new address and a refreshed `updated_at`
    ///
    /// Phone and creation time are carried over. `updated_at` never moves
    /// backwards, even when the clock does.
    pub fn with_address(&self, address: String, now: DateTime<Utc>) -> Self {
        Self {
            phone: self.phone.clone(),
            address,
            created_at: self.created_at,
            updated_at: now.max(self.updated_at),
        }
    }

    /// Storage form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the storage form and check the record's own invariants
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let record: Self = serde_json::from_str(raw).map_err(|e| e.to_string())?;

        let phone = validate_phone(&record.phone).map_err(|e| e.to_string())?;
        if phone != record.phone {
            return Err("stored phone is not in canonical form".to_string());
        }
        let address = validate_address(&record.address).map_err(|e| e.to_string())?;
        if address != record.address {
            return Err("stored address is not trimmed".to_string());
        }
        if record.updated_at < record.created_at {
            return Err("updated_at precedes created_at".to_string());
        }

        Ok(record)
    }
}

/// Body of `POST /phone`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatePhoneAddressRequest {
    pub phone: String,
    pub address: String,
}

/// Body of `PUT /phone/{phone}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateAddressRequest {
    pub address: String,
}
