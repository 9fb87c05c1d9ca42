//! Azure Data Explorer REST collaborators
//!
//! Concrete implementations of the crate's two external seams:
//!
//! - [`AdxClient`] speaks the cluster's v1 REST protocol and implements
//!   both [`crate::schema::SchemaSource`] and
//!   [`crate::transport::QueryTransport`]
//! - [`QueryResponse`] is the wire frame those endpoints return

mod client;
mod response;

pub use client::{AdxClient, AdxConfig};
pub use response::{QueryResponse, ResponseColumn, ResponseTable};
