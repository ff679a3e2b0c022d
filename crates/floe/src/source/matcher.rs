//! Resolves a table configuration to the files that belong to it.

use regex::Regex;
use tracing::debug;

use floe_core::emit;
use floe_core::metrics::events::FilesMatched;

use super::{ObjectCatalog, ObjectDescriptor};
use crate::config::TableConfig;
use crate::error::{ConfigError, StorageError};

/// Compiled view of one table's file selection rules.
#[derive(Debug, Clone)]
pub struct TableMatcher {
    table: String,
    prefix: String,
    pattern: Regex,
}

impl TableMatcher {
    /// Compile the table's search pattern.
    ///
    /// Fails naming the table before any storage access.
    pub fn new(table: &TableConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            table: table.table_name.clone(),
            prefix: table.search_prefix.clone(),
            pattern: table.compile_pattern()?,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether an object's basename contains a match of the pattern.
    pub fn matches(&self, object: &ObjectDescriptor) -> bool {
        self.pattern.is_match(object.basename())
    }

    /// List the table's non-empty matching files, sorted by path.
    pub async fn resolve(
        &self,
        catalog: &dyn ObjectCatalog,
    ) -> Result<Vec<ObjectDescriptor>, StorageError> {
        let listed = catalog.list_objects(&self.prefix).await?;
        let total = listed.len();

        let mut matched: Vec<_> = listed
            .into_iter()
            .filter(|object| object.size_bytes > 0 && self.matches(object))
            .collect();
        matched.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(
            target = %self.table,
            prefix = %self.prefix,
            pattern = %self.pattern,
            listed = total,
            matched = matched.len(),
            "Resolved table files"
        );
        emit!(FilesMatched {
            count: matched.len() as u64,
            target: self.table.clone(),
        });

        Ok(matched)
    }
}
