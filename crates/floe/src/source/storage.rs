//! Parquet access over a storage provider.
//!
//! Footers and row groups are fetched with ranged reads, so neither schema
//! inference nor sync downloads a whole file up front.

use std::time::Instant;

use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use parquet::arrow::ParquetRecordBatchStreamBuilder;
use parquet::arrow::async_reader::ParquetObjectReader;
use parquet::errors::ParquetError;
use snafu::prelude::*;
use tracing::debug;

use floe_core::emit;
use floe_core::metrics::events::{
    RequestStatus, StorageOperation, StorageRequest, StorageRequestDuration,
};

use super::{BatchStream, ObjectCatalog, ObjectDescriptor, StorageProvider};
use crate::error::{OpenSnafu, ParquetFooterSnafu, ReaderError, SchemaError, StorageError};

/// Reader over one listed object. The listed path is already encoded.
fn parquet_reader(
    storage: &StorageProvider,
    object: &ObjectDescriptor,
) -> Result<ParquetObjectReader, ParquetError> {
    let path = Path::parse(&object.path).map_err(|e| ParquetError::External(Box::new(e)))?;
    let location = storage.qualify_path(&path).into_owned();
    Ok(ParquetObjectReader::new(storage.object_store(), location)
        .with_file_size(object.size_bytes))
}

async fn open_parquet(
    storage: &StorageProvider,
    object: &ObjectDescriptor,
) -> Result<ParquetRecordBatchStreamBuilder<ParquetObjectReader>, ParquetError> {
    let start = Instant::now();
    let result = match parquet_reader(storage, object) {
        Ok(reader) => ParquetRecordBatchStreamBuilder::new(reader).await,
        Err(e) => Err(e),
    };

    let status = if result.is_ok() {
        RequestStatus::Success
    } else {
        RequestStatus::Error
    };
    emit!(StorageRequest {
        operation: StorageOperation::Read,
        status,
    });
    emit!(StorageRequestDuration {
        operation: StorageOperation::Read,
        duration: start.elapsed(),
    });

    result
}

#[async_trait]
impl ObjectCatalog for StorageProvider {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectDescriptor>, StorageError> {
        StorageProvider::list_objects(self, prefix).await
    }

    async fn read_columns(&self, object: &ObjectDescriptor) -> Result<SchemaRef, SchemaError> {
        let builder = open_parquet(self, object)
            .await
            .context(ParquetFooterSnafu { path: &object.path })?;

        debug!(
            path = %object.path,
            columns = builder.schema().fields().len(),
            row_groups = builder.metadata().num_row_groups(),
            "Read parquet footer"
        );

        Ok(builder.schema().clone())
    }

    async fn read_batches(
        &self,
        object: &ObjectDescriptor,
        batch_size: usize,
    ) -> Result<BatchStream, ReaderError> {
        let stream = open_parquet(self, object)
            .await
            .context(OpenSnafu { path: &object.path })?
            .with_batch_size(batch_size)
            .build()
            .context(OpenSnafu { path: &object.path })?;

        let path = object.path.clone();
        Ok(stream
            .map_err(move |source| ReaderError::Decode {
                path: path.clone(),
                source,
            })
            .boxed())
    }
}
