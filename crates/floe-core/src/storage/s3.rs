//! Amazon S3 (and S3-compatible) backend.

use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{S3ConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// S3 storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: String,
    pub key: Option<Path>,
}

impl StorageProvider {
    /// Build an S3 store. `options` are `object_store` S3 config keys
    /// (e.g. `aws_access_key_id`, `aws_region`) applied after the environment.
    pub(super) async fn construct_s3(
        config: S3Config,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        for (key, value) in &options {
            builder = builder.with_config(key.parse().context(S3ConfigSnafu)?, value.clone());
        }

        builder = builder.with_retry(RetryConfig::default());

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false)
                .with_allow_http(true);
        }

        let root = match (&config.region, &config.endpoint) {
            (_, Some(endpoint)) => format!("s3::{}/{}", endpoint, config.bucket),
            (Some(region), _) => format!("https://s3.{}.amazonaws.com/{}", region, config.bucket),
            _ => format!("s3://{}", config.bucket),
        };
        let canonical_url = match &config.key {
            Some(key) => format!("{root}/{key}"),
            None => root,
        };
        debug!(url = %canonical_url, options = options.len(), "Building S3 store");

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(S3ConfigSnafu)?);

        Ok(Self {
            config: BackendConfig::S3(config),
            object_store,
            canonical_url,
        })
    }
}
