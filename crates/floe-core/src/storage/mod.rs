//! Multi-cloud storage abstraction.
//!
//! Provides a unified interface for listing and reading objects on S3, GCS,
//! Azure Blob Storage, and the local filesystem.

mod azure;
mod gcs;
mod local;
mod s3;
mod url_parser;

pub use url_parser::BackendConfig;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use object_store::ObjectStore;
use object_store::path::Path;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::emit;
use crate::error::StorageError;
use crate::metrics::events::{
    RequestStatus, StorageOperation, StorageRequest, StorageRequestDuration,
};

// Re-export config types
pub use azure::AzureConfig;
pub use gcs::GcsConfig;
pub use local::LocalConfig;
pub use s3::S3Config;

/// An object found while listing, with the metadata needed for incremental sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Path relative to the storage root (e.g., "exports/2020/a.parquet").
    pub path: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Last-modified timestamp reported by the store.
    pub last_modified: DateTime<Utc>,
}

impl ObjectDescriptor {
    /// The final path segment.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Storage provider that abstracts over different cloud storage backends.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

impl StorageProvider {
    /// Create a storage provider for the given URL with storage options.
    pub async fn for_url_with_options(
        url: &str,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        let config = BackendConfig::parse_url(url)?;

        match config {
            BackendConfig::S3(config) => Self::construct_s3(config, options).await,
            BackendConfig::Gcs(config) => Self::construct_gcs(config, options).await,
            BackendConfig::Azure(config) => Self::construct_azure(config, options).await,
            BackendConfig::Local(config) => Self::construct_local(config).await,
        }
    }

    /// List objects whose relative path starts with `prefix`.
    ///
    /// Follows S3 prefix semantics: `"exports/day_"` matches
    /// `"exports/day_1.parquet"`. The directory part of the prefix is listed
    /// recursively and entries are then filtered by the full string prefix.
    /// The object store pages through large listings internally.
    ///
    /// Returned paths are relative to the configured key prefix, sorted.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectDescriptor>, StorageError> {
        let start = Instant::now();
        let directory = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };

        let list_root: Option<Path> = match (self.config.key(), directory.is_empty()) {
            (Some(key), true) => Some(key.clone()),
            (Some(key), false) => Some(key.parts().chain(Path::from(directory).parts()).collect()),
            (None, true) => None,
            (None, false) => Some(Path::from(directory)),
        };

        let key_part_count = self
            .config
            .key()
            .map(|key| key.parts().count())
            .unwrap_or_default();

        let mut stream = self.object_store.list(list_root.as_ref());
        let mut objects = Vec::new();
        let mut total_listed = 0;

        while let Some(result) = stream.next().await {
            let meta = match result {
                Ok(meta) => meta,
                // A missing prefix is an empty listing
                Err(object_store::Error::NotFound { .. }) => break,
                Err(source) => {
                    emit!(StorageRequest {
                        operation: StorageOperation::List,
                        status: RequestStatus::Error,
                    });
                    return Err(StorageError::ObjectStore { source });
                }
            };
            total_listed += 1;

            // Strip the base prefix so callers get relative paths
            let relative: Path = meta.location.parts().skip(key_part_count).collect();
            let path = relative.to_string();
            if !path.starts_with(prefix) {
                continue;
            }

            objects.push(ObjectDescriptor {
                path,
                size_bytes: meta.size,
                last_modified: meta.last_modified,
            });
        }

        emit!(StorageRequest {
            operation: StorageOperation::List,
            status: RequestStatus::Success,
        });
        emit!(StorageRequestDuration {
            operation: StorageOperation::List,
            duration: start.elapsed(),
        });

        debug!(
            prefix = %prefix,
            total_listed,
            matched = objects.len(),
            "Listed objects under prefix"
        );

        objects.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(objects)
    }

    /// Qualify a path with the configured key prefix.
    pub fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// The underlying object store, for readers that fetch byte ranges themselves.
    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.object_store)
    }

    /// Canonical URL of the storage root, for logging.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }
}
