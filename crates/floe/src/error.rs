//! Error types for the floe connector.

use snafu::prelude::*;

// Re-export common errors
pub use floe_core::error::{ConfigError, StorageError};

/// Errors that can occur while inferring a table's schema from file footers.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SchemaError {
    /// A column's storage type has no JSON representation.
    #[snafu(display(
        "Column '{column}' of table '{table}' has unsupported storage type '{storage_type}'"
    ))]
    UnsupportedType {
        table: String,
        column: String,
        storage_type: String,
    },

    /// Failed to read the parquet footer of a file.
    #[snafu(display("Failed to read parquet metadata from {path}: {source}"))]
    ParquetFooter {
        path: String,
        source: parquet::errors::ParquetError,
    },
}

/// Errors that can occur while streaming row batches out of a file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReaderError {
    /// Failed to open the file or read its footer.
    #[snafu(display("Failed to open parquet file {path}: {source}"))]
    Open {
        path: String,
        source: parquet::errors::ParquetError,
    },

    /// Failed to decode a row batch.
    #[snafu(display("Failed to decode row batch in {path}: {source}"))]
    Decode {
        path: String,
        source: parquet::errors::ParquetError,
    },

    /// A column type cannot be converted to JSON values.
    #[snafu(display("Column '{column}' has unsupported type {data_type} for record conversion"))]
    UnsupportedColumn { column: String, data_type: String },

    /// An Arrow compute kernel failed.
    #[snafu(display("Failed to normalize column '{column}': {source}"))]
    Normalize {
        column: String,
        source: arrow::error::ArrowError,
    },
}

/// Errors that can occur when coercing a row against the declared schema.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransformError {
    /// A value matches none of the field's permitted types.
    #[snafu(display(
        "Value {value} of field '{field}' in stream '{stream}' does not conform to type {expected}"
    ))]
    TypeMismatch {
        stream: String,
        field: String,
        expected: String,
        value: String,
    },
}

/// Errors that can occur when writing protocol messages.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EmitError {
    /// Failed to serialize a message.
    #[snafu(display("Failed to serialize message: {source}"))]
    Serialize { source: serde_json::Error },

    /// Failed to write to the output channel.
    #[snafu(display("Failed to write message: {source}"))]
    Write { source: std::io::Error },
}

/// Top-level connector errors. Every variant is fatal to the current run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TapError {
    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Storage error.
    #[snafu(display("Storage error: {source}"))]
    Storage { source: StorageError },

    /// Schema inference error.
    #[snafu(display("Schema inference error: {source}"))]
    Schema { source: SchemaError },

    /// Reader error.
    #[snafu(display("Reader error: {source}"))]
    Reader { source: ReaderError },

    /// Transform error.
    #[snafu(display("Transform error: {source}"))]
    Transform { source: TransformError },

    /// Emit error.
    #[snafu(display("Output error: {source}"))]
    Emit { source: EmitError },
}

impl From<ConfigError> for TapError {
    fn from(source: ConfigError) -> Self {
        TapError::Config { source }
    }
}

impl From<StorageError> for TapError {
    fn from(source: StorageError) -> Self {
        TapError::Storage { source }
    }
}

impl From<SchemaError> for TapError {
    fn from(source: SchemaError) -> Self {
        TapError::Schema { source }
    }
}

impl From<ReaderError> for TapError {
    fn from(source: ReaderError) -> Self {
        TapError::Reader { source }
    }
}

impl From<TransformError> for TapError {
    fn from(source: TransformError) -> Self {
        TapError::Transform { source }
    }
}

impl From<EmitError> for TapError {
    fn from(source: EmitError) -> Self {
        TapError::Emit { source }
    }
}
