//! Catalog building.
//!
//! For each configured table: resolve its files, infer the schema from
//! their footers, and describe it as a stream with table and field metadata.

use tracing::info;

use crate::catalog::{Breadcrumb, Catalog, Inclusion, Metadata, MetadataEntry, StreamDescriptor};
use crate::config::{Config, TableConfig};
use crate::error::{ConfigError, TapError};
use crate::schema::{InferredSchema, SchemaCache};
use crate::source::ObjectCatalog;

/// Build the catalog for every configured table, in configuration order.
///
/// Output depends only on the configuration and the storage contents, so
/// running it twice against unchanged storage gives identical catalogs.
pub async fn discover(config: &Config, catalog: &dyn ObjectCatalog) -> Result<Catalog, TapError> {
    let mut cache = SchemaCache::new();
    let mut streams = Vec::with_capacity(config.tables.len());

    for table in &config.tables {
        info!(target = %table.table_name, "Discovering table");
        let schema = cache.schema_for(catalog, table).await?;
        if schema.is_empty() {
            info!(target = %table.table_name, "No files matched, schema has no fields");
        }
        streams.push(describe_stream(table, schema)?);
    }

    info!(streams = streams.len(), "Discovery finished");
    Ok(Catalog { streams })
}

/// Describe one table as a stream.
///
/// Fails if a key property is not a field of the inferred schema.
pub fn describe_stream(
    table: &TableConfig,
    schema: &InferredSchema,
) -> Result<StreamDescriptor, ConfigError> {
    if let Some(field) = table
        .key_properties
        .iter()
        .find(|key| schema.field(key).is_none())
    {
        return Err(ConfigError::MissingKeyProperty {
            table: table.table_name.clone(),
            field: field.clone(),
        });
    }

    Ok(StreamDescriptor {
        stream: table.table_name.clone(),
        tap_stream_id: table.table_name.clone(),
        schema: schema.clone(),
        metadata: build_metadata(table, schema),
    })
}

/// Table entry first, then one entry per field in name order.
fn build_metadata(table: &TableConfig, schema: &InferredSchema) -> Vec<MetadataEntry> {
    let table_entry = MetadataEntry::new(
        Breadcrumb::table(),
        Metadata {
            table_key_properties: Some(table.key_properties.clone()),
            ..Default::default()
        },
    );

    let field_entries = schema.field_names().map(|name| {
        let inclusion = if table.key_properties.iter().any(|key| key == name) {
            Inclusion::Automatic
        } else {
            Inclusion::Available
        };
        MetadataEntry::new(
            Breadcrumb::property(name),
            Metadata {
                inclusion: Some(inclusion),
                ..Default::default()
            },
        )
    });

    std::iter::once(table_entry).chain(field_entries).collect()
}
