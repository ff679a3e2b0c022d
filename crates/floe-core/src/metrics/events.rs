//! Internal events for floe metrics emission.
//!
//! Each event struct represents a measurable occurrence during discovery or
//! sync. Per-table events carry a `target` label with the table name.

use metrics::{counter, histogram};
use std::time::Duration;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Storage operation kind.
#[derive(Debug, Clone, Copy)]
pub enum StorageOperation {
    List,
    Read,
}

impl StorageOperation {
    fn as_str(&self) -> &'static str {
        match self {
            StorageOperation::List => "list",
            StorageOperation::Read => "read",
        }
    }
}

/// Outcome of a storage request.
#[derive(Debug, Clone, Copy)]
pub enum RequestStatus {
    Success,
    Error,
}

impl RequestStatus {
    fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "success",
            RequestStatus::Error => "error",
        }
    }
}

/// Event emitted for each request against object storage.
pub struct StorageRequest {
    pub operation: StorageOperation,
    pub status: RequestStatus,
}

impl InternalEvent for StorageRequest {
    fn emit(self) {
        trace!(
            operation = self.operation.as_str(),
            status = self.status.as_str(),
            "Storage request"
        );
        counter!(
            "floe_storage_requests_total",
            "operation" => self.operation.as_str(),
            "status" => self.status.as_str()
        )
        .increment(1);
    }
}

/// Event emitted with the latency of a storage request.
pub struct StorageRequestDuration {
    pub operation: StorageOperation,
    pub duration: Duration,
}

impl InternalEvent for StorageRequestDuration {
    fn emit(self) {
        histogram!(
            "floe_storage_request_duration_seconds",
            "operation" => self.operation.as_str()
        )
        .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when a table's search pattern has been resolved.
pub struct FilesMatched {
    pub count: u64,
    pub target: String,
}

impl InternalEvent for FilesMatched {
    fn emit(self) {
        trace!(count = self.count, target = %self.target, "Files matched");
        counter!("floe_files_matched_total", "target" => self.target).increment(self.count);
    }
}

/// Event emitted after every record of a file has been written.
pub struct FileSynced {
    pub records: u64,
    pub duration: Duration,
    pub target: String,
}

impl InternalEvent for FileSynced {
    fn emit(self) {
        trace!(records = self.records, target = %self.target, "File synced");
        counter!("floe_files_synced_total", "target" => self.target.clone()).increment(1);
        counter!("floe_records_emitted_total", "target" => self.target.clone())
            .increment(self.records);
        histogram!("floe_file_sync_duration_seconds", "target" => self.target)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when a state checkpoint is written.
pub struct StateEmitted {
    pub target: String,
}

impl InternalEvent for StateEmitted {
    fn emit(self) {
        trace!(target = %self.target, "State emitted");
        counter!("floe_state_messages_total", "target" => self.target).increment(1);
    }
}
