//! Storage type names and their JSON type mapping.
//!
//! Column types read from file footers are first named as storage types
//! (`int`, `timestamp`, `struct`, ...) and then looked up in a fixed table.

use std::fmt;

use arrow::datatypes::DataType;

use super::JsonType;

/// Storage-level type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    String,
    Binary,
    Date,
    Timestamp,
    Array,
    Map,
    Struct,
    Null,
    Other(String),
}

impl StorageType {
    /// Name an Arrow data type.
    ///
    /// Unsigned integers take the next wider signed name. Dictionary columns
    /// are named after their value type.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Boolean => StorageType::Boolean,
            DataType::Int8 => StorageType::TinyInt,
            DataType::Int16 | DataType::UInt8 => StorageType::SmallInt,
            DataType::Int32 | DataType::UInt16 => StorageType::Int,
            DataType::Int64 | DataType::UInt32 | DataType::UInt64 => StorageType::BigInt,
            DataType::Float16 | DataType::Float32 => StorageType::Float,
            DataType::Float64 => StorageType::Double,
            DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => StorageType::Decimal,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => StorageType::String,
            DataType::Binary
            | DataType::LargeBinary
            | DataType::BinaryView
            | DataType::FixedSizeBinary(_) => StorageType::Binary,
            DataType::Date32 | DataType::Date64 => StorageType::Date,
            DataType::Timestamp(_, _) => StorageType::Timestamp,
            DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _) => {
                StorageType::Array
            }
            DataType::Map(_, _) => StorageType::Map,
            DataType::Struct(_) => StorageType::Struct,
            DataType::Null => StorageType::Null,
            DataType::Dictionary(_, value) => StorageType::from_arrow(value),
            other => StorageType::Other(other.to_string()),
        }
    }

    /// JSON type for this storage type, or `None` if it has no JSON form.
    pub fn json_type(&self) -> Option<JsonType> {
        match self {
            StorageType::Boolean => Some(JsonType::Boolean),
            StorageType::TinyInt
            | StorageType::SmallInt
            | StorageType::Int
            | StorageType::BigInt
            | StorageType::Float
            | StorageType::Double
            | StorageType::Decimal => Some(JsonType::Number),
            StorageType::String | StorageType::Date | StorageType::Timestamp => {
                Some(JsonType::String)
            }
            StorageType::Array => Some(JsonType::Array),
            StorageType::Struct => Some(JsonType::Object),
            StorageType::Null => Some(JsonType::Null),
            StorageType::Binary | StorageType::Map | StorageType::Other(_) => None,
        }
    }
}

/// First column path at or below `name` whose storage type has no JSON form.
///
/// Struct children are addressed as `parent.child`; list elements share the
/// list's path. Returns the path and the offending storage type.
pub fn unsupported_column(name: &str, data_type: &DataType) -> Option<(String, StorageType)> {
    match data_type {
        DataType::Struct(fields) => fields.iter().find_map(|field| {
            unsupported_column(&format!("{name}.{}", field.name()), field.data_type())
        }),
        DataType::List(item) | DataType::LargeList(item) | DataType::FixedSizeList(item, _) => {
            unsupported_column(name, item.data_type())
        }
        DataType::Dictionary(_, value) => unsupported_column(name, value),
        other => {
            let storage_type = StorageType::from_arrow(other);
            match storage_type.json_type() {
                Some(_) => None,
                None => Some((name.to_string(), storage_type)),
            }
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageType::Boolean => "boolean",
            StorageType::TinyInt => "tinyint",
            StorageType::SmallInt => "smallint",
            StorageType::Int => "int",
            StorageType::BigInt => "bigint",
            StorageType::Float => "float",
            StorageType::Double => "double",
            StorageType::Decimal => "decimal",
            StorageType::String => "string",
            StorageType::Binary => "binary",
            StorageType::Date => "date",
            StorageType::Timestamp => "timestamp",
            StorageType::Array => "array",
            StorageType::Map => "map",
            StorageType::Struct => "struct",
            StorageType::Null => "null",
            StorageType::Other(name) => return write!(f, "other({name})"),
        };
        f.write_str(name)
    }
}
