//! Common error types for the phone address service

use thiserror::Error;

use crate::kv::KvError;

/// Common result type for bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bringing the service up or down
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value store could not be opened or prepared
    #[error("Store error: {0}")]
    Store(#[from] KvError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
