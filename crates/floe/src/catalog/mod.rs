//! Discovery catalog: one stream descriptor per configured table.
//!
//! The catalog printed by discovery is edited by users (typically to set
//! `selected: true` on streams) and handed back to sync.

mod metadata;

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

pub use metadata::{Breadcrumb, Inclusion, Metadata, MetadataEntry};

use crate::error::{ConfigError, EmitError, SerializeSnafu, WriteSnafu};
use crate::schema::InferredSchema;
use floe_core::error::{FileNotFoundSnafu, JsonParseSnafu, ReadFileSnafu};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<StreamDescriptor>,
}

impl Catalog {
    /// Load a catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        ensure!(path.exists(), FileNotFoundSnafu { path });
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        serde_json::from_str(&contents).context(JsonParseSnafu { path })
    }

    /// Write the catalog as indented JSON followed by a newline.
    pub fn write_pretty<W: Write>(&self, mut writer: W) -> Result<(), EmitError> {
        serde_json::to_writer_pretty(&mut writer, self).context(SerializeSnafu)?;
        writeln!(writer).context(WriteSnafu)?;
        writer.flush().context(WriteSnafu)
    }

    pub fn stream(&self, tap_stream_id: &str) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.tap_stream_id == tap_stream_id)
    }

    pub fn stream_mut(&mut self, tap_stream_id: &str) -> Option<&mut StreamDescriptor> {
        self.streams
            .iter_mut()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Streams whose table-level metadata has `selected: true`.
    pub fn selected_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_selected())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub stream: String,
    pub tap_stream_id: String,
    pub schema: InferredSchema,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl StreamDescriptor {
    /// Metadata at the table breadcrumb.
    pub fn table_metadata(&self) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|entry| entry.breadcrumb.is_table())
            .map(|entry| &entry.metadata)
    }

    /// Metadata at a field's breadcrumb.
    pub fn field_metadata(&self, field: &str) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|entry| entry.breadcrumb.property_name() == Some(field))
            .map(|entry| &entry.metadata)
    }

    /// A stream is synced only when explicitly selected.
    pub fn is_selected(&self) -> bool {
        self.table_metadata()
            .and_then(|m| m.selected)
            .unwrap_or(false)
    }

    /// Key properties declared at the table breadcrumb.
    pub fn key_properties(&self) -> Option<&[String]> {
        self.table_metadata()
            .and_then(|m| m.table_key_properties.as_deref())
    }

    /// Set `selected` at the table breadcrumb, adding the entry if missing.
    pub fn set_selected(&mut self, selected: bool) {
        match self
            .metadata
            .iter_mut()
            .find(|entry| entry.breadcrumb.is_table())
        {
            Some(entry) => entry.metadata.selected = Some(selected),
            None => self.metadata.insert(
                0,
                MetadataEntry::new(
                    Breadcrumb::table(),
                    Metadata {
                        selected: Some(selected),
                        ..Default::default()
                    },
                ),
            ),
        }
    }
}
