//! pas-api library - phone address service
//!
//! Stores phone-number-to-address associations behind a small HTTP API.
//! Request flow: correlation middleware → handler → [`service`] →
//! [`repository`] → key-value store.

use axum::Router;
use chrono::{DateTime, Utc};
use pas_common::KeyValueStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod correlation;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use crate::error::{ApiError, ApiResult};

use crate::repository::KvPhoneAddressRepository;
use crate::service::PhoneAddressService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Business operations on phone records
    pub service: Arc<PhoneAddressService>,
    /// Store handle, used directly only by the health probe
    pub store: Arc<dyn KeyValueStore>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the store-backed repository and service around `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let repository = Arc::new(KvPhoneAddressRepository::new(store.clone()));
        Self {
            service: Arc::new(PhoneAddressService::new(repository)),
            store,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// The correlation layer wraps every route, including unmatched ones, so
/// all responses carry the correlation header.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    Router::new()
        .merge(api::phone_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(middleware::from_fn(correlation::correlation_middleware))
        .layer(CorsLayer::permissive())
}
