//! Google Cloud Storage backend.

use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{GcsConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// Google Cloud Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsConfig {
    pub bucket: String,
    pub key: Option<Path>,
}

impl StorageProvider {
    /// `options` are `object_store` GCS config keys (e.g.
    /// `google_service_account_key`), applied over the environment.
    pub(super) async fn construct_gcs(
        config: GcsConfig,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        let mut builder = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(&config.bucket)
            .with_retry(RetryConfig::default());

        for (key, value) in &options {
            builder = builder.with_config(key.parse().context(GcsConfigSnafu)?, value.clone());
        }

        let root = format!("gs://{}", config.bucket);
        let canonical_url = match &config.key {
            Some(key) => format!("{root}/{key}"),
            None => root,
        };
        debug!(url = %canonical_url, options = options.len(), "Building GCS store");

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(GcsConfigSnafu)?);

        Ok(Self {
            config: BackendConfig::Gcs(config),
            object_store,
            canonical_url,
        })
    }
}
