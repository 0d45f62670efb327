//! HTTP API handlers for pas-api

pub mod health;
pub mod phone;

pub use health::health_routes;
pub use phone::phone_routes;
