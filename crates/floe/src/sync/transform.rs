//! Coerces rows to a stream's declared schema.

use serde_json::{Number, Value};

use crate::catalog::{Inclusion, MetadataEntry};
use crate::error::TransformError;
use crate::schema::{FieldSchema, InferredSchema, JsonType};
use crate::source::Row;

/// Row transformer for one stream.
///
/// Fields absent from the schema, fields marked `inclusion: unsupported`
/// and fields deselected with `selected: false` (unless automatic) are
/// dropped. Kept values are coerced to the first permitted type they
/// satisfy.
#[derive(Debug, Clone)]
pub struct Transformer {
    stream: String,
    fields: Vec<(String, FieldSchema)>,
}

impl Transformer {
    pub fn new(stream: &str, schema: &InferredSchema, metadata: &[MetadataEntry]) -> Self {
        let fields = schema
            .properties
            .iter()
            .filter(|(name, _)| is_emitted(metadata, name))
            .map(|(name, field)| (name.clone(), field.clone()))
            .collect();

        Self {
            stream: stream.to_string(),
            fields,
        }
    }

    /// Names of the fields this transformer keeps.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn transform(&self, mut row: Row) -> Result<Row, TransformError> {
        let mut out = Row::new();

        for (name, field) in &self.fields {
            let Some(value) = row.remove(name) else {
                continue;
            };
            let coerced = coerce(&value, field).ok_or_else(|| TransformError::TypeMismatch {
                stream: self.stream.clone(),
                field: name.clone(),
                expected: field.to_string(),
                value: value.to_string(),
            })?;
            out.insert(name.clone(), coerced);
        }

        Ok(out)
    }
}

fn is_emitted(metadata: &[MetadataEntry], field: &str) -> bool {
    let Some(entry) = metadata
        .iter()
        .find(|entry| entry.breadcrumb.property_name() == Some(field))
    else {
        return true;
    };

    match (entry.metadata.inclusion, entry.metadata.selected) {
        (Some(Inclusion::Unsupported), _) => false,
        (Some(Inclusion::Automatic), _) => true,
        (_, Some(false)) => false,
        _ => true,
    }
}

fn coerce(value: &Value, field: &FieldSchema) -> Option<Value> {
    if value.is_null() {
        return field.permits(JsonType::Null).then_some(Value::Null);
    }
    field.types().find_map(|json_type| coerce_to(value, json_type))
}

fn coerce_to(value: &Value, json_type: JsonType) -> Option<Value> {
    match (json_type, value) {
        (JsonType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (JsonType::Boolean, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (JsonType::Number, Value::Number(_)) => Some(value.clone()),
        (JsonType::Number, Value::String(s)) => parse_number(s.trim()).map(Value::Number),
        (JsonType::String, Value::String(_)) => Some(value.clone()),
        (JsonType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (JsonType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (JsonType::Array, Value::Array(_)) => Some(value.clone()),
        (JsonType::Object, Value::Object(_)) => Some(value.clone()),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}
