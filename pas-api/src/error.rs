//! Error types for pas-api
//!
//! Repository errors are translated from store failures once, at the
//! repository boundary, and pass through the service unchanged. Absence
//! ("not found") is never an error inside the service; it becomes 404 only
//! when a handler builds the response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pas_common::KvError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ValidationError;

/// Failures raised by a repository implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Phone already stored (create only)
    #[error("Phone number {0} already exists")]
    Duplicate(String),

    /// Store unreachable or timed out; transient
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unexpected store-reported fault, including unacknowledged writes
    #[error("Store error: {0}")]
    Store(String),

    /// Stored value cannot be read back as a record
    #[error("Corrupted data stored for {phone}: {reason}")]
    CorruptData { phone: String, reason: String },
}

impl From<KvError> for RepositoryError {
    fn from(err: KvError) -> Self {
        match err {
            KvError::Unavailable(msg) => RepositoryError::StoreUnavailable(msg),
            KvError::Backend(msg) => RepositoryError::Store(msg),
        }
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures surfaced by the service layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Rejected before any store access
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Stable classification name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::Repository(RepositoryError::Duplicate(_)) => "duplicate",
            ServiceError::Repository(RepositoryError::StoreUnavailable(_)) => "store_unavailable",
            ServiceError::Repository(RepositoryError::Store(_)) => "store",
            ServiceError::Repository(RepositoryError::CorruptData { .. }) => "corrupt_data",
        }
    }

    /// Caused by the request rather than by the service or its store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::Repository(RepositoryError::Duplicate(_))
        )
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409) - phone already registered
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Store unavailable (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::BadRequest(e.to_string()),
            ServiceError::Repository(RepositoryError::Duplicate(phone)) => {
                ApiError::Conflict(format!("Phone number {} already exists", phone))
            }
            ServiceError::Repository(RepositoryError::StoreUnavailable(_)) => {
                ApiError::Unavailable("Store service unavailable".to_string())
            }
            ServiceError::Repository(RepositoryError::Store(_)) => {
                ApiError::Internal("Database error occurred".to_string())
            }
            ServiceError::Repository(RepositoryError::CorruptData { .. }) => {
                ApiError::Internal("Stored data is corrupted".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), message = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), message = %message, "Request rejected");
        }

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
