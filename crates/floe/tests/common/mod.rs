//! In-memory object storage for sync and discovery tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, Int32Array, RecordBatch, StringArray};
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::StreamExt;

use floe::error::{ReaderError, SchemaError, StorageError};
use floe::source::BatchStream;
use floe::{Config, ObjectCatalog, ObjectDescriptor};

struct MemoryFile {
    object: ObjectDescriptor,
    batches: Vec<RecordBatch>,
    schema: SchemaRef,
}

/// Object catalog backed by record batches held in memory.
///
/// Records the paths opened by `read_batches`, in order.
#[derive(Default)]
pub struct MemoryCatalog {
    files: Vec<MemoryFile>,
    reads: Mutex<Vec<String>>,
    failing: Option<String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file holding `batch`, with a nominal non-zero size.
    pub fn with_file(self, path: &str, last_modified: DateTime<Utc>, batch: RecordBatch) -> Self {
        self.with_sized_file(path, 1024, last_modified, batch)
    }

    pub fn with_sized_file(
        mut self,
        path: &str,
        size_bytes: u64,
        last_modified: DateTime<Utc>,
        batch: RecordBatch,
    ) -> Self {
        self.files.push(MemoryFile {
            object: ObjectDescriptor {
                path: path.to_string(),
                size_bytes,
                last_modified,
            },
            schema: batch.schema(),
            batches: vec![batch],
        });
        self
    }

    /// Make decoding of `path` fail after its first batch.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing = Some(path.to_string());
        self
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    fn file(&self, path: &str) -> &MemoryFile {
        self.files
            .iter()
            .find(|f| f.object.path == path)
            .unwrap_or_else(|| panic!("no such file: {path}"))
    }
}

#[async_trait]
impl ObjectCatalog for MemoryCatalog {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectDescriptor>, StorageError> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.object.path.starts_with(prefix))
            .map(|f| f.object.clone())
            .collect())
    }

    async fn read_columns(&self, object: &ObjectDescriptor) -> Result<SchemaRef, SchemaError> {
        Ok(self.file(&object.path).schema.clone())
    }

    async fn read_batches(
        &self,
        object: &ObjectDescriptor,
        _batch_size: usize,
    ) -> Result<BatchStream, ReaderError> {
        self.reads.lock().unwrap().push(object.path.clone());
        let file = self.file(&object.path);

        let mut items: Vec<Result<RecordBatch, ReaderError>> =
            file.batches.iter().cloned().map(Ok).collect();
        if self.failing.as_deref() == Some(object.path.as_str()) {
            items.push(Err(ReaderError::UnsupportedColumn {
                column: "corrupt".to_string(),
                data_type: "unknown".to_string(),
            }));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

/// Timestamp on 2020-02-01 at the given time of day.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 2, 1, hour, minute, 0).unwrap()
}

/// Batch with columns `id: int32` and `name: utf8`.
pub fn people(ids: &[i32], names: &[&str]) -> RecordBatch {
    RecordBatch::try_from_iter([
        ("id", Arc::new(Int32Array::from(ids.to_vec())) as ArrayRef),
        ("name", Arc::new(StringArray::from(names.to_vec())) as ArrayRef),
    ])
    .unwrap()
}

/// Config with one table `t` over `p/*.parquet`, keyed by `id`.
pub fn single_table_config() -> Config {
    Config::parse(
        r#"
bucket: b
start_date: "2020-01-01T00:00:00Z"
tables:
  - table_name: t
    search_prefix: p/
    search_pattern: "\\.parquet$"
    key_properties: [id]
"#,
    )
    .unwrap()
}
