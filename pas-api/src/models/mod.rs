//! Domain entity, request payloads and input validation

pub mod record;
pub mod validation;

pub use record::{CreatePhoneAddressRequest, PhoneAddressRecord, UpdateAddressRequest};
pub use validation::{validate_address, validate_phone, ValidationError};
