//! # Phone Address Service Common Library
//!
//! Shared code for the phone address service crates:
//! - Bootstrap configuration (TOML file + command-line overrides)
//! - Tracing initialisation
//! - Key-value store abstraction and its implementations
//! - Common error type

pub mod config;
pub mod error;
pub mod kv;
pub mod logging;

pub use error::{Error, Result};
pub use kv::{KeyValueStore, KvError, KvResult};
