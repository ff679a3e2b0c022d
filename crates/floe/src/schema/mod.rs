//! JSON-schema model for discovered streams.
//!
//! - `types`: Storage type names and their JSON type mapping
//! - `inference`: Schema inference from file footers

pub mod inference;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use inference::{SchemaCache, infer_schema};
pub use types::{StorageType, unsupported_column};

/// Primitive JSON type a field may hold.
///
/// The declaration order is the order types appear in a field's union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Boolean,
    Number,
    String,
    Array,
    Object,
    Null,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::Boolean => "boolean",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single field: a union of permitted JSON types.
///
/// Serialized as `{"type": [...]}`; a bare string is accepted when reading
/// a hand-edited catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSchema {
    types: BTreeSet<JsonType>,
}

impl FieldSchema {
    /// A field permitting `declared` or null.
    pub fn nullable(declared: JsonType) -> Self {
        Self::from_types([declared, JsonType::Null])
    }

    pub fn from_types(types: impl IntoIterator<Item = JsonType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    /// Permitted types in union order.
    pub fn types(&self) -> impl Iterator<Item = JsonType> + '_ {
        self.types.iter().copied()
    }

    pub fn permits(&self, json_type: JsonType) -> bool {
        self.types.contains(&json_type)
    }
}

impl fmt::Display for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.types.iter().map(JsonType::as_str).collect();
        f.write_str(&names.join("|"))
    }
}

#[derive(Serialize)]
struct FieldSchemaRepr<'a> {
    #[serde(rename = "type")]
    types: Vec<&'a JsonType>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeDecl {
    One(JsonType),
    Many(Vec<JsonType>),
}

#[derive(Deserialize)]
struct FieldSchemaInput {
    #[serde(rename = "type")]
    types: TypeDecl,
}

impl Serialize for FieldSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FieldSchemaRepr {
            types: self.types.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = FieldSchemaInput::deserialize(deserializer)?;
        Ok(match input.types {
            TypeDecl::One(json_type) => FieldSchema::from_types([json_type]),
            TypeDecl::Many(types) => FieldSchema::from_types(types),
        })
    }
}

fn object_type() -> String {
    "object".to_string()
}

/// Inferred schema of a stream: an object with one property per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredSchema {
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, FieldSchema>,
}

impl Default for InferredSchema {
    fn default() -> Self {
        Self {
            schema_type: object_type(),
            properties: BTreeMap::new(),
        }
    }
}

impl InferredSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.properties.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
