//! Local filesystem backend, mainly for development and tests.

use object_store::ObjectStore;
use object_store::local::LocalFileSystem;
use snafu::prelude::*;
use std::sync::Arc;

use crate::error::{LocalConfigSnafu, StorageError};

use super::{BackendConfig, StorageProvider};

/// Local filesystem configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub path: String,
}

impl StorageProvider {
    /// The root directory must already exist; a connector never creates its source.
    pub(super) async fn construct_local(config: LocalConfig) -> Result<Self, StorageError> {
        let object_store: Arc<dyn ObjectStore> = Arc::new(
            LocalFileSystem::new_with_prefix(&config.path).context(LocalConfigSnafu {
                path: config.path.clone(),
            })?,
        );

        let canonical_url = format!("file://{}", config.path);

        Ok(Self {
            config: BackendConfig::Local(config),
            object_store,
            canonical_url,
        })
    }
}
