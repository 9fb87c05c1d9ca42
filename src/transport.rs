//! Query transport seam
//!
//! The editing core never talks to the network itself; it hands compiled
//! query text to a [`QueryTransport`] collaborator and gets back typed
//! rows or a structured error. Retry and backoff policy live entirely in
//! the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Executes query text against a database
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Run the query and return its primary result table
    async fn execute(&self, query: &str, database: &str) -> Result<TableResult, TransportError>;
}

/// The primary result table of a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableResult {
    /// Column metadata, in result order
    pub columns: Vec<ResultColumn>,
    /// Row-major cell values
    pub rows: Vec<Vec<CellValue>>,
}

impl TableResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Name and engine-native type of a result column
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub name: String,
    /// Native type name as reported by the engine (e.g. `datetime`, `long`)
    pub column_type: String,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// One cell of a result row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{}", value),
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::String(value) => write!(f, "{}", value),
            CellValue::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
        }
    }
}

/// Errors surfaced by a transport implementation
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint could not be reached
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    /// The request timed out
    #[error("request timed out")]
    Timeout,

    /// The engine rejected the query
    #[error("query failed ({status}): {message}")]
    Query { status: u16, message: String },

    /// The response could not be interpreted
    #[error("malformed response: {0}")]
    Decode(String),
}
