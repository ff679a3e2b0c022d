//! Azure Blob Storage / ADLS Gen2 backend.

use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AzureConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// Azure Blob Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub account: String,
    pub container: String,
    pub key: Option<Path>,
}

impl StorageProvider {
    /// `options` are `object_store` Azure config keys (e.g.
    /// `azure_storage_account_key`), applied over the environment.
    pub(super) async fn construct_azure(
        config: AzureConfig,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        let mut builder = MicrosoftAzureBuilder::from_env()
            .with_account(&config.account)
            .with_container_name(&config.container)
            .with_retry(RetryConfig::default());

        for (key, value) in &options {
            builder = builder.with_config(key.parse().context(AzureConfigSnafu)?, value.clone());
        }

        let root = format!(
            "abfss://{}@{}.dfs.core.windows.net",
            config.container, config.account
        );
        let canonical_url = match &config.key {
            Some(key) => format!("{root}/{key}"),
            None => root,
        };
        debug!(url = %canonical_url, options = options.len(), "Building Azure store");

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(AzureConfigSnafu)?);

        Ok(Self {
            config: BackendConfig::Azure(config),
            object_store,
            canonical_url,
        })
    }
}
