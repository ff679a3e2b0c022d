//! Configuration for the floe connector.

mod cli;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use snafu::prelude::*;

pub use cli::{CliArgs, LogLevel, Mode};
pub use floe_core::config::{InterpolationResult, interpolate};

use crate::error::ConfigError;
use floe_core::error::{
    DuplicateTableSnafu, EmptyBucketSnafu, EmptyTableNameSnafu, EnvInterpolationSnafu,
    FileNotFoundSnafu, InvalidBatchSizeSnafu, InvalidPatternSnafu,
    InvalidStartDateSnafu, ReadFileSnafu, YamlParseSnafu,
};
use crate::time::parse_timestamp;

fn default_batch_size() -> usize {
    10_000
}

/// One configured table: which files belong to it and how rows are keyed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableConfig {
    /// Name of the table, also used as the stream id.
    pub table_name: String,
    /// Key prefix under the bucket root where the table's files live.
    #[serde(default)]
    pub search_prefix: String,
    /// Regex searched (not fully matched) against each file's basename.
    pub search_pattern: String,
    /// Fields uniquely identifying a row.
    #[serde(default)]
    pub key_properties: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    bucket: String,
    start_date: String,
    #[serde(default)]
    tables: Vec<TableConfig>,
    #[serde(default)]
    storage_options: HashMap<String, String>,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
}

/// Main configuration.
///
/// # Example
///
/// ```yaml
/// bucket: s3://my-bucket
/// start_date: "2020-01-01T00:00:00Z"
/// storage_options:
///   AWS_REGION: ${AWS_REGION:-us-east-1}
/// tables:
///   - table_name: events
///     search_prefix: exports/events/
///     search_pattern: "\\.parquet$"
///     key_properties: [id]
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage root, either a URL or a bare S3 bucket name.
    pub bucket: String,
    /// Lower bound for files of tables with no bookmark.
    pub start_date: DateTime<Utc>,
    /// Configured tables in declaration order.
    pub tables: Vec<TableConfig>,
    /// Options passed to the storage backend builder.
    pub storage_options: HashMap<String, String>,
    /// Rows per record batch when reading files.
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        ensure!(path.exists(), FileNotFoundSnafu { path });
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML (or JSON) string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let result = interpolate(contents);
        if !result.is_ok() {
            return EnvInterpolationSnafu {
                message: result.errors.join("\n"),
            }
            .fail();
        }

        let raw: RawConfig = serde_yaml::from_str(&result.text).context(YamlParseSnafu)?;

        let start_date = parse_timestamp(&raw.start_date).context(InvalidStartDateSnafu {
            value: raw.start_date.clone(),
        })?;

        let tables = raw
            .tables
            .into_iter()
            .map(|mut table| {
                let mut seen = HashSet::new();
                table.key_properties.retain(|key| seen.insert(key.clone()));
                table
            })
            .collect();

        let config = Config {
            bucket: raw.bucket,
            start_date,
            tables,
            storage_options: raw.storage_options,
            batch_size: raw.batch_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Checks:
    /// - `bucket` is not empty
    /// - every table has a unique, non-empty name
    /// - every `search_pattern` compiles
    /// - `batch_size` is positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.bucket.trim().is_empty(), EmptyBucketSnafu);
        ensure!(self.batch_size > 0, InvalidBatchSizeSnafu);

        let mut names = HashSet::new();
        for (index, table) in self.tables.iter().enumerate() {
            ensure!(!table.table_name.is_empty(), EmptyTableNameSnafu { index });
            ensure!(
                names.insert(table.table_name.as_str()),
                DuplicateTableSnafu {
                    table: &table.table_name
                }
            );
            table.compile_pattern()?;
        }

        Ok(())
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.table_name == name)
    }

    /// Storage URL for the bucket. Bare names are treated as S3 buckets.
    pub fn bucket_url(&self) -> String {
        let bucket = self.bucket.trim();
        if bucket.contains(':') || bucket.starts_with('/') {
            bucket.to_string()
        } else {
            format!("s3://{bucket}")
        }
    }
}

impl TableConfig {
    /// Compile the table's search pattern.
    pub fn compile_pattern(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.search_pattern).context(InvalidPatternSnafu {
            table: &self.table_name,
            pattern: &self.search_pattern,
        })
    }
}
