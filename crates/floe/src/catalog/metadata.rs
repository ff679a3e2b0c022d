//! Stream and field metadata entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path to the thing a metadata entry describes: `[]` for the stream,
/// `["properties", <field>]` for a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breadcrumb(Vec<String>);

impl Breadcrumb {
    pub fn table() -> Self {
        Self(Vec::new())
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self(vec!["properties".to_string(), name.into()])
    }

    pub fn is_table(&self) -> bool {
        self.0.is_empty()
    }

    /// Field name, if this breadcrumb points at a field.
    pub fn property_name(&self) -> Option<&str> {
        match self.0.as_slice() {
            [kind, name] if kind == "properties" => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Whether a field is always emitted or may be deselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    Automatic,
    Available,
    Unsupported,
}

/// Properties attached to a breadcrumb.
///
/// Keys this connector does not interpret are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(
        rename = "table-key-properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub table_key_properties: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub breadcrumb: Breadcrumb,
    pub metadata: Metadata,
}

impl MetadataEntry {
    pub fn new(breadcrumb: Breadcrumb, metadata: Metadata) -> Self {
        Self {
            breadcrumb,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_breadcrumbs() {
        assert!(Breadcrumb::table().is_table());
        assert_eq!(Breadcrumb::table().property_name(), None);

        let field = Breadcrumb::property("id");
        assert!(!field.is_table());
        assert_eq!(field.property_name(), Some("id"));
        assert_eq!(serde_json::to_value(&field).unwrap(), json!(["properties", "id"]));
    }

    #[test]
    fn test_unset_keys_are_omitted() {
        let metadata = Metadata {
            inclusion: Some(Inclusion::Available),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({"inclusion": "available"})
        );
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let input = json!({
            "breadcrumb": [],
            "metadata": {
                "table-key-properties": ["id"],
                "selected": true,
                "replication-method": "INCREMENTAL"
            }
        });

        let entry: MetadataEntry = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(entry.metadata.selected, Some(true));
        assert_eq!(
            entry.metadata.table_key_properties,
            Some(vec!["id".to_string()])
        );
        assert_eq!(serde_json::to_value(&entry).unwrap(), input);
    }
}
