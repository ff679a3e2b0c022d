//! floe-core: Shared components for the floe connector.
//!
//! This crate contains the infrastructure the connector is built on:
//!
//! - `storage/` - Multi-cloud storage abstraction (S3, GCS, Azure, local)
//! - `config/` - Environment variable interpolation for config files
//! - `metrics/` - Internal metric events
//! - `tracing` - Log initialization (stderr, env-filter)
//! - `error` - Common error types

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod tracing;

// Re-export commonly used items
pub use config::{InterpolationResult, interpolate};
pub use error::{ConfigError, StorageError};
pub use storage::{ObjectDescriptor, StorageProvider};
pub use crate::tracing::init_tracing;
