//! Common error types shared by the floe crates.
//!
//! Storage errors surface failures of the object storage collaborator
//! verbatim; configuration errors identify the offending table or stream.

use snafu::prelude::*;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed: {source}"))]
    ObjectStore { source: object_store::Error },

    /// S3 configuration error.
    #[snafu(display("S3 configuration error: {source}"))]
    S3Config { source: object_store::Error },

    /// GCS configuration error.
    #[snafu(display("GCS configuration error: {source}"))]
    GcsConfig { source: object_store::Error },

    /// Azure configuration error.
    #[snafu(display("Azure configuration error: {source}"))]
    AzureConfig { source: object_store::Error },

    /// Local filesystem configuration error.
    #[snafu(display("Local storage error for {path}: {source}"))]
    LocalConfig {
        path: String,
        source: object_store::Error,
    },
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Bucket is empty.
    #[snafu(display("Config option 'bucket' cannot be empty"))]
    EmptyBucket,

    /// A table has no name.
    #[snafu(display("Table at position {index} has an empty table_name"))]
    EmptyTableName { index: usize },

    /// Two tables share a name.
    #[snafu(display("Table '{table}' is configured more than once"))]
    DuplicateTable { table: String },

    /// The search pattern of a table is not a valid regex.
    #[snafu(display("search_pattern for table '{table}' is not a valid regex: {pattern}"))]
    InvalidPattern {
        table: String,
        pattern: String,
        source: regex::Error,
    },

    /// The start date could not be parsed.
    #[snafu(display("start_date '{value}' is not a valid timestamp"))]
    InvalidStartDate { value: String },

    /// Batch size must be positive.
    #[snafu(display("batch_size must be greater than zero"))]
    InvalidBatchSize,

    /// A catalog stream has no configured table.
    #[snafu(display("Catalog stream '{stream}' does not match any configured table"))]
    UnknownStream { stream: String },

    /// A key property is not part of the inferred schema.
    #[snafu(display(
        "Key property '{field}' of table '{table}' is not present in the inferred schema"
    ))]
    MissingKeyProperty { table: String, field: String },

    /// Environment variable interpolation failed.
    #[snafu(display("Environment variable interpolation failed:\n{message}"))]
    EnvInterpolation { message: String },

    /// A file given on the command line does not exist.
    #[snafu(display("File \"{}\" not found", path.display()))]
    FileNotFound { path: std::path::PathBuf },

    /// Failed to read a file.
    #[snafu(display("Failed to read file \"{}\": {source}", path.display()))]
    ReadFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse YAML (or JSON) configuration.
    #[snafu(display("Failed to parse config: {source}"))]
    YamlParse { source: serde_yaml::Error },

    /// A JSON document (catalog) is invalid.
    #[snafu(display("File \"{}\" is not valid JSON: {source}", path.display()))]
    JsonParse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}
