//! # kqlforge
//!
//! Visual query builder core for Azure Data Explorer (Kusto). Queries are
//! built either as raw KQL text or as a structured visual expression
//! (source table, filters, aggregations, grouping); this crate owns the
//! mapping between the two and the schema plumbing that keeps it honest.
//!
//! ## Features
//!
//! - **Expression model**: tagged-union tree for the visual query,
//!   round-tripping through the host's saved-query JSON
//! - **Normalizer**: keeps a partially-edited filter well-formed as its
//!   column type, operator, or value shape changes
//! - **Compiler**: deterministic, total translation of an expression plus
//!   a resolved schema into pipe-stage KQL text
//! - **Schema resolver**: session-scoped metadata cache with in-flight
//!   request de-duplication
//! - **Editing session**: rebuilds the tree on every edit, recompiles the
//!   text projection, and injects time-series bucketing defaults
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kqlforge::adx::{AdxClient, AdxConfig};
//! use kqlforge::expr::{KustoQuery, Property, PropertyType};
//! use kqlforge::schema::SchemaResolver;
//! use kqlforge::session::QuerySession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(AdxClient::new(AdxConfig::default()));
//!     let resolver = Arc::new(SchemaResolver::new(client.clone()));
//!
//!     let mut session = QuerySession::new(resolver, KustoQuery::default());
//!     session.initialize().await?;
//!     session
//!         .set_from(Property::new("Covid19", PropertyType::String))
//!         .await?;
//!
//!     println!("{}", session.query().query);
//!
//!     let result = session.run(client.as_ref()).await?;
//!     println!("{} rows", result.len());
//!
//!     Ok(())
//! }
//! ```

pub mod adx;
pub mod config;
pub mod expr;
pub mod kql;
pub mod schema;
pub mod session;
pub mod transport;

// Re-export top-level types for convenience
pub use expr::{
    ArrayExpression, Combinator, Expression, GroupByExpression, KustoQuery, Operator,
    OperatorExpression, OperatorName, OperatorValue, Property, PropertyExpression, PropertyType,
    QueryExpression, ReduceExpression, ReduceFunction, ResultFormat, ScalarValue,
};

pub use kql::{compile, suggestion_query, INTERVAL_MACRO};

pub use schema::{
    ColumnSchema, DatabaseSchema, Schema, SchemaError, SchemaResolver, SchemaResult, SchemaSource,
    TableSchema,
};

pub use session::QuerySession;

pub use transport::{CellValue, QueryTransport, ResultColumn, TableResult, TransportError};

pub use adx::{AdxClient, AdxConfig};

pub use config::{Config, ConfigError, LoggingConfig};
