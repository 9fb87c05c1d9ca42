//! Kusto REST response parsing
//!
//! The v1 REST endpoints answer with a frame of tables; the first table is
//! the primary result. Cells arrive as loosely-typed JSON and are coerced
//! using the column's declared type. Management schema queries return the
//! whole schema document as JSON text inside a single cell.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::schema::Schema;
use crate::transport::{CellValue, ResultColumn, TableResult, TransportError};

/// A full response frame
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "Tables", default)]
    pub tables: Vec<ResponseTable>,
}

/// One table of a response frame
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseTable {
    #[serde(rename = "TableName", default)]
    pub name: String,
    #[serde(rename = "Columns", default)]
    pub columns: Vec<ResponseColumn>,
    #[serde(rename = "Rows", default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Column metadata in a response frame
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseColumn {
    #[serde(rename = "ColumnName", default)]
    pub name: String,
    #[serde(rename = "ColumnType", default)]
    pub column_type: String,
    #[serde(rename = "DataType", default)]
    pub data_type: String,
}

impl ResponseColumn {
    /// The engine type name, preferring `ColumnType` over `DataType`
    fn type_name(&self) -> &str {
        if !self.column_type.is_empty() {
            &self.column_type
        } else {
            &self.data_type
        }
    }
}

impl QueryResponse {
    /// Convert the primary result table into typed rows
    pub fn into_table_result(self) -> Result<TableResult, TransportError> {
        let Some(table) = self.tables.into_iter().next() else {
            return Ok(TableResult::default());
        };

        let columns: Vec<ResultColumn> = table
            .columns
            .iter()
            .map(|column| ResultColumn::new(column.name.clone(), column.type_name()))
            .collect();

        let rows = table
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(index, value)| {
                        let type_name = table
                            .columns
                            .get(index)
                            .map(ResponseColumn::type_name)
                            .unwrap_or_default();
                        coerce_cell(value, type_name)
                    })
                    .collect()
            })
            .collect();

        Ok(TableResult { columns, rows })
    }

    /// Extract the schema document from a `.show databases schema as json`
    /// management response
    pub fn into_schema(self) -> Result<Schema, TransportError> {
        let cell = self
            .tables
            .into_iter()
            .next()
            .and_then(|table| table.rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
            .ok_or_else(|| TransportError::Decode("empty schema response".to_string()))?;

        match cell {
            serde_json::Value::String(text) => serde_json::from_str(&text)
                .map_err(|error| TransportError::Decode(error.to_string())),
            value => serde_json::from_value(value)
                .map_err(|error| TransportError::Decode(error.to_string())),
        }
    }
}

/// Coerce one JSON cell using the column's declared type
fn coerce_cell(value: serde_json::Value, type_name: &str) -> CellValue {
    if value.is_null() {
        return CellValue::Null;
    }

    match type_name.to_lowercase().as_str() {
        "datetime" | "date" => match value.as_str().and_then(parse_datetime) {
            Some(timestamp) => CellValue::DateTime(timestamp),
            None => CellValue::String(stringify(value)),
        },
        "bool" | "boolean" => match value.as_bool() {
            Some(flag) => CellValue::Bool(flag),
            None => CellValue::String(stringify(value)),
        },
        "int" | "long" | "real" | "double" | "decimal" => match value.as_f64() {
            Some(number) => CellValue::Number(number),
            None => CellValue::String(stringify(value)),
        },
        _ => CellValue::String(stringify(value)),
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn stringify(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> QueryResponse {
        serde_json::from_value(serde_json::json!({
            "Tables": [{
                "TableName": "Table_0",
                "Columns": [
                    { "ColumnName": "Timestamp", "ColumnType": "datetime" },
                    { "ColumnName": "State", "ColumnType": "string" },
                    { "ColumnName": "Deaths", "ColumnType": "long" },
                    { "ColumnName": "Active", "ColumnType": "bool" }
                ],
                "Rows": [
                    ["2020-03-01T00:00:00Z", "Texas", 12, true],
                    [null, "Ohio", 7, false]
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_primary_table_rows_are_typed() {
        let result = sample_response().into_table_result().unwrap();

        assert_eq!(result.columns.len(), 4);
        assert_eq!(result.columns[2].column_type, "long");
        assert_eq!(result.len(), 2);

        assert!(matches!(result.rows[0][0], CellValue::DateTime(_)));
        assert_eq!(result.rows[0][1], CellValue::String("Texas".to_string()));
        assert_eq!(result.rows[0][2], CellValue::Number(12.0));
        assert_eq!(result.rows[1][0], CellValue::Null);
        assert_eq!(result.rows[1][3], CellValue::Bool(false));
    }

    #[test]
    fn test_empty_frame_is_an_empty_result() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(response.into_table_result().unwrap().is_empty());
    }

    #[test]
    fn test_schema_document_inside_a_cell() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "Tables": [{
                "TableName": "Table_0",
                "Columns": [{ "ColumnName": "DatabaseSchema", "ColumnType": "string" }],
                "Rows": [[
                    "{\"Databases\":{\"Samples\":{\"Name\":\"Samples\",\"Tables\":{},\"ExternalTables\":{}}}}"
                ]]
            }]
        }))
        .unwrap();

        let schema = response.into_schema().unwrap();
        assert!(schema.databases.contains_key("Samples"));
    }

    #[test]
    fn test_schema_from_empty_response_is_an_error() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            response.into_schema(),
            Err(TransportError::Decode(_))
        ));
    }
}
