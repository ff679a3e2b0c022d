//! Floe: discovers the schemas of parquet files in object storage and
//! streams their records incrementally.
//!
//! This crate handles:
//! - Resolving configured tables to files by prefix and basename pattern
//! - Inferring a JSON schema per table from parquet footers
//! - Building a catalog of streams with table and field metadata
//! - Syncing selected streams file by file, with per-table bookmarks

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod schema;
pub mod source;
pub mod sync;
pub mod time;

// Re-export commonly used items
pub use catalog::{Catalog, StreamDescriptor};
pub use config::{CliArgs, Config, Mode, TableConfig};
pub use discovery::discover;
pub use error::TapError;
pub use protocol::{Emitter, JsonLinesEmitter, Message};
pub use schema::InferredSchema;
pub use source::ObjectCatalog;
pub use sync::{SyncEngine, SyncState, sync};

// Re-export from floe-core
pub use floe_core::{ObjectDescriptor, StorageProvider, init_tracing};
