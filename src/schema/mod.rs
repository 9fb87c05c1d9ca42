//! Cluster metadata: schema model and resolver
//!
//! - **Types**: the schema document (databases, tables, typed columns) as
//!   returned by the management endpoint
//! - **Resolver**: session-owned cache with in-flight de-duplication
//!
//! The resolver is the only place the crate coordinates concurrency:
//! near-simultaneous edits against the same table must not issue
//! redundant fetches, and the eventual result is broadcast to every
//! caller awaiting it.

mod error;
mod resolver;
mod types;

pub use error::{SchemaError, SchemaResult};
pub use resolver::{SchemaResolver, SchemaSource};
pub use types::{
    column_definitions, csl_to_property_type, first_datetime_column, ColumnSchema, DatabaseSchema,
    Schema, TableSchema,
};
