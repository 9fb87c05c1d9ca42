//! Schema resolution error types

use thiserror::Error;

/// Errors that can occur while fetching or slicing cluster metadata
///
/// Cloneable so one failed fetch can be broadcast to every caller that
/// attached to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema source could not be reached
    #[error("schema source unavailable: {0}")]
    Unavailable(String),

    /// The schema source answered with an error
    #[error("schema fetch failed: {0}")]
    Fetch(String),

    /// The fetched document could not be interpreted
    #[error("malformed schema document: {0}")]
    Malformed(String),
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
