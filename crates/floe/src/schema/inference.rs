//! Schema inference from file footers.
//!
//! Column types come from parquet metadata only; no rows are scanned. The
//! schema reported for a table is the one of its newest file. Every column
//! is nullable in the result because nullability is not reliable across
//! files.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use snafu::prelude::*;
use tracing::debug;

use super::{FieldSchema, InferredSchema, StorageType, unsupported_column};
use crate::config::TableConfig;
use crate::error::{SchemaError, TapError, UnsupportedTypeSnafu};
use crate::source::{ObjectCatalog, ObjectDescriptor, TableMatcher};

/// Infer a table's schema from the footer of the newest of `objects`.
///
/// The newest file is the one with the greatest `(last_modified, path)`,
/// so the result does not depend on the order of `objects`. Empty objects
/// are ignored; with no candidates the schema has no fields. Nested
/// columns are checked down to their leaves.
pub async fn infer_schema(
    catalog: &dyn ObjectCatalog,
    table: &str,
    objects: &[ObjectDescriptor],
) -> Result<InferredSchema, SchemaError> {
    let mut schema = InferredSchema::default();

    let Some(newest) = objects
        .iter()
        .filter(|o| o.size_bytes > 0)
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.path.cmp(&b.path))
        })
    else {
        return Ok(schema);
    };

    let columns = catalog.read_columns(newest).await?;
    for field in columns.fields() {
        if let Some((column, storage_type)) = unsupported_column(field.name(), field.data_type())
        {
            return UnsupportedTypeSnafu {
                table,
                column,
                storage_type: storage_type.to_string(),
            }
            .fail();
        }

        let storage_type = StorageType::from_arrow(field.data_type());
        let json_type = storage_type.json_type().context(UnsupportedTypeSnafu {
            table,
            column: field.name(),
            storage_type: storage_type.to_string(),
        })?;
        schema
            .properties
            .insert(field.name().clone(), FieldSchema::nullable(json_type));
    }

    debug!(
        target = %table,
        path = %newest.path,
        candidates = objects.len(),
        fields = schema.properties.len(),
        "Inferred schema from newest file"
    );
    Ok(schema)
}

/// Schemas inferred during one discovery run, keyed by table name.
///
/// Lives only as long as the run that owns it.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: HashMap<String, InferredSchema>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table's schema, resolving its files and inferring it on
    /// first use.
    pub async fn schema_for(
        &mut self,
        catalog: &dyn ObjectCatalog,
        table: &TableConfig,
    ) -> Result<&InferredSchema, TapError> {
        match self.schemas.entry(table.table_name.clone()) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let matcher = TableMatcher::new(table)?;
                let files = matcher.resolve(catalog).await?;
                let schema = infer_schema(catalog, &table.table_name, &files).await?;
                Ok(&*entry.insert(schema))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReaderError, StorageError};
    use crate::schema::JsonType;
    use crate::source::BatchStream;
    use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed footer schema per path and counts listings and footer reads.
    struct Footers {
        files: Vec<(ObjectDescriptor, SchemaRef)>,
        listings: AtomicUsize,
        footer_reads: AtomicUsize,
    }

    impl Footers {
        /// Files as `(path, size, hour of 2020-02-01, columns)`.
        fn new(files: Vec<(&str, u64, u32, Vec<Field>)>) -> Self {
            let files = files
                .into_iter()
                .map(|(path, size_bytes, hour, fields)| {
                    let object = ObjectDescriptor {
                        path: path.to_string(),
                        size_bytes,
                        last_modified: Utc.with_ymd_and_hms(2020, 2, 1, hour, 0, 0).unwrap(),
                    };
                    (object, Arc::new(Schema::new(fields)))
                })
                .collect();
            Self {
                files,
                listings: AtomicUsize::new(0),
                footer_reads: AtomicUsize::new(0),
            }
        }

        fn objects(&self) -> Vec<ObjectDescriptor> {
            self.files.iter().map(|(o, _)| o.clone()).collect()
        }
    }

    #[async_trait]
    impl ObjectCatalog for Footers {
        async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectDescriptor>, StorageError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .objects()
                .into_iter()
                .filter(|o| o.path.starts_with(prefix))
                .collect())
        }

        async fn read_columns(&self, object: &ObjectDescriptor) -> Result<SchemaRef, SchemaError> {
            self.footer_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .files
                .iter()
                .find(|(o, _)| o.path == object.path)
                .map(|(_, schema)| schema.clone())
                .unwrap())
        }

        async fn read_batches(
            &self,
            _: &ObjectDescriptor,
            _: usize,
        ) -> Result<BatchStream, ReaderError> {
            unreachable!("inference never reads batches")
        }
    }

    fn field(name: &str, data_type: DataType) -> Field {
        Field::new(name, data_type, false)
    }

    #[tokio::test]
    async fn test_every_field_is_nullable() {
        let footers = Footers::new(vec![(
            "a.parquet",
            10,
            0,
            vec![field("id", DataType::Int32), field("name", DataType::Utf8)],
        )]);

        let schema = infer_schema(&footers, "t", &footers.objects()).await.unwrap();

        assert_eq!(schema.field("id").unwrap().to_string(), "number|null");
        assert_eq!(schema.field("name").unwrap().to_string(), "string|null");
    }

    #[tokio::test]
    async fn test_newest_file_wins_regardless_of_order() {
        let footers = Footers::new(vec![
            (
                "b.parquet",
                10,
                1,
                vec![field("v", DataType::Int64), field("dropped", DataType::Utf8)],
            ),
            (
                "a.parquet",
                10,
                2,
                vec![field("v", DataType::Utf8), field("extra", DataType::Boolean)],
            ),
        ]);
        let mut reversed = footers.objects();
        reversed.reverse();

        let forward = infer_schema(&footers, "t", &footers.objects()).await.unwrap();
        let backward = infer_schema(&footers, "t", &reversed).await.unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.field("v").unwrap().to_string(), "string|null");
        assert!(!forward.field("v").unwrap().permits(JsonType::Number));
        assert!(forward.field("extra").is_some());
        assert!(forward.field("dropped").is_none());
        assert_eq!(footers.footer_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_equal_timestamps_pick_greatest_path() {
        let footers = Footers::new(vec![
            ("p/b.parquet", 10, 3, vec![field("from_b", DataType::Int32)]),
            ("p/a.parquet", 10, 3, vec![field("from_a", DataType::Int32)]),
        ]);

        let schema = infer_schema(&footers, "t", &footers.objects()).await.unwrap();

        assert!(schema.field("from_b").is_some());
        assert!(schema.field("from_a").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_type_is_reported() {
        let footers = Footers::new(vec![(
            "a.parquet",
            10,
            0,
            vec![field("id", DataType::Int32), field("payload", DataType::Binary)],
        )]);

        let err = infer_schema(&footers, "t", &footers.objects())
            .await
            .unwrap_err();

        match err {
            SchemaError::UnsupportedType {
                table,
                column,
                storage_type,
            } => {
                assert_eq!(table, "t");
                assert_eq!(column, "payload");
                assert_eq!(storage_type, "binary");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_nested_type_is_reported_with_path() {
        let attrs = DataType::Struct(Fields::from(vec![
            Field::new("label", DataType::Utf8, true),
            Field::new("blob", DataType::Binary, true),
        ]));
        let footers = Footers::new(vec![(
            "a.parquet",
            10,
            0,
            vec![field("id", DataType::Int32), field("attrs", attrs)],
        )]);

        let err = infer_schema(&footers, "t", &footers.objects())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SchemaError::UnsupportedType { ref column, ref storage_type, .. }
                if column == "attrs.blob" && storage_type == "binary"
        ));
    }

    #[tokio::test]
    async fn test_empty_objects_are_ignored() {
        let footers = Footers::new(vec![
            ("a.parquet", 10, 0, vec![field("id", DataType::Int32)]),
            ("empty.parquet", 0, 5, vec![field("ghost", DataType::Utf8)]),
        ]);

        let schema = infer_schema(&footers, "t", &footers.objects()).await.unwrap();
        assert!(schema.field("id").is_some());
        assert!(schema.field("ghost").is_none());
    }

    #[tokio::test]
    async fn test_no_objects_gives_empty_schema() {
        let footers = Footers::new(vec![]);

        let schema = infer_schema(&footers, "t", &[]).await.unwrap();

        assert!(schema.is_empty());
        assert_eq!(footers.footer_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_infers_each_table_once() {
        let footers = Footers::new(vec![(
            "p/a.parquet",
            10,
            0,
            vec![field("id", DataType::Int32)],
        )]);
        let table = TableConfig {
            table_name: "t".to_string(),
            search_prefix: "p/".to_string(),
            search_pattern: "parquet".to_string(),
            key_properties: vec![],
        };
        let mut cache = SchemaCache::new();

        let first = cache.schema_for(&footers, &table).await.unwrap().clone();
        let second = cache.schema_for(&footers, &table).await.unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(footers.listings.load(Ordering::SeqCst), 1);
        assert_eq!(footers.footer_reads.load(Ordering::SeqCst), 1);
    }
}
