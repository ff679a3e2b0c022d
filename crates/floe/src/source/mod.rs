//! Access to the objects backing each table.
//!
//! - `matcher`: Resolves a table configuration to its matching files
//! - `storage`: [`ObjectCatalog`] over a [`StorageProvider`]
//! - `rows`: Record batch projection, normalization and conversion to JSON rows

pub mod matcher;
pub mod rows;
pub mod storage;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{ReaderError, SchemaError, StorageError};

pub use floe_core::{ObjectDescriptor, StorageProvider};
pub use matcher::TableMatcher;
pub use rows::{Row, batch_to_rows, normalize_batch, project_batch};

/// Lazy, finite sequence of record batches read from one file.
pub type BatchStream = BoxStream<'static, Result<RecordBatch, ReaderError>>;

/// Object storage as seen by discovery and sync.
///
/// Calls are awaited one at a time; implementations need not support
/// concurrent use.
#[async_trait]
pub trait ObjectCatalog: Send + Sync {
    /// List objects whose path starts with `prefix`, with size and
    /// last-modified time.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectDescriptor>, StorageError>;

    /// Read a file's column names and types from its footer.
    async fn read_columns(&self, object: &ObjectDescriptor) -> Result<SchemaRef, SchemaError>;

    /// Open a file as a stream of record batches of at most `batch_size` rows.
    ///
    /// The stream is not restartable; re-reading starts from the beginning.
    async fn read_batches(
        &self,
        object: &ObjectDescriptor,
        batch_size: usize,
    ) -> Result<BatchStream, ReaderError>;
}
