//! Schema document model
//!
//! Typed view of the cluster metadata returned by the ADX management
//! endpoint: databases, their tables (regular and external), and ordered,
//! typed columns. Field names follow the management endpoint's PascalCase
//! keys so the fetched document deserializes directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::expr::{Property, PropertyType};

/// The full schema document for a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "Databases", default)]
    pub databases: HashMap<String, DatabaseSchema>,
}

/// One database: its tables and external tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Tables", default)]
    pub tables: HashMap<String, TableSchema>,
    #[serde(rename = "ExternalTables", default)]
    pub external_tables: HashMap<String, TableSchema>,
}

impl DatabaseSchema {
    /// Regular tables followed by external tables
    pub fn all_tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values().chain(self.external_tables.values())
    }
}

/// One table and its columns, in schema order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "OrderedColumns", default)]
    pub ordered_columns: Vec<ColumnSchema>,
}

/// One column: name plus the engine's native (CSL) type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "CslType", default)]
    pub csl_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, csl_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            csl_type: csl_type.into(),
        }
    }

    /// The editor-facing type of this column
    pub fn property_type(&self) -> PropertyType {
        csl_to_property_type(&self.csl_type)
    }
}

/// Map an engine-native type name to an editor property type
///
/// Unrecognized type names fall back to String so schema drift never
/// breaks compilation.
pub fn csl_to_property_type(csl_type: &str) -> PropertyType {
    match csl_type.to_lowercase().as_str() {
        "bool" | "boolean" => PropertyType::Boolean,
        "datetime" | "date" => PropertyType::DateTime,
        "int" | "long" | "real" | "double" | "decimal" => PropertyType::Number,
        _ => PropertyType::String,
    }
}

/// Typed column references for a table, in schema order
pub fn column_definitions(columns: &[ColumnSchema]) -> Vec<Property> {
    columns
        .iter()
        .map(|column| Property::new(column.name.clone(), column.property_type()))
        .collect()
}

/// The first datetime-typed column of a table, if any
pub fn first_datetime_column(columns: &[ColumnSchema]) -> Option<&ColumnSchema> {
    columns
        .iter()
        .find(|column| column.property_type() == PropertyType::DateTime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csl_type_mapping() {
        assert_eq!(csl_to_property_type("bool"), PropertyType::Boolean);
        assert_eq!(csl_to_property_type("datetime"), PropertyType::DateTime);
        assert_eq!(csl_to_property_type("long"), PropertyType::Number);
        assert_eq!(csl_to_property_type("real"), PropertyType::Number);
        assert_eq!(csl_to_property_type("string"), PropertyType::String);
        assert_eq!(csl_to_property_type("guid"), PropertyType::String);
        assert_eq!(csl_to_property_type("timespan"), PropertyType::String);
    }

    #[test]
    fn test_unknown_csl_type_defaults_to_string() {
        assert_eq!(csl_to_property_type("dynamic"), PropertyType::String);
        assert_eq!(csl_to_property_type("made_up_type"), PropertyType::String);
    }

    #[test]
    fn test_first_datetime_column() {
        let columns = vec![
            ColumnSchema::new("State", "string"),
            ColumnSchema::new("Timestamp", "datetime"),
            ColumnSchema::new("Updated", "datetime"),
        ];

        assert_eq!(first_datetime_column(&columns).unwrap().name, "Timestamp");
        assert!(first_datetime_column(&columns[..1]).is_none());
    }

    #[test]
    fn test_schema_document_deserializes_pascal_case() {
        let raw = serde_json::json!({
            "Databases": {
                "Samples": {
                    "Name": "Samples",
                    "Tables": {
                        "Covid19": {
                            "Name": "Covid19",
                            "OrderedColumns": [
                                { "Name": "Timestamp", "CslType": "datetime" },
                                { "Name": "State", "CslType": "string" }
                            ]
                        }
                    },
                    "ExternalTables": {
                        "Archive": { "Name": "Archive", "OrderedColumns": [] }
                    }
                }
            }
        });

        let schema: Schema = serde_json::from_value(raw).unwrap();
        let database = &schema.databases["Samples"];
        assert_eq!(database.tables["Covid19"].ordered_columns.len(), 2);
        assert_eq!(database.all_tables().count(), 2);
    }

    #[test]
    fn test_column_definitions_preserve_order() {
        let columns = vec![
            ColumnSchema::new("Timestamp", "datetime"),
            ColumnSchema::new("Deaths", "long"),
        ];
        let definitions = column_definitions(&columns);

        assert_eq!(definitions[0], Property::new("Timestamp", PropertyType::DateTime));
        assert_eq!(definitions[1], Property::new("Deaths", PropertyType::Number));
    }
}
