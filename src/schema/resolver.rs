//! Schema resolver
//!
//! Session-owned cache of cluster metadata. The full schema document is
//! fetched from the source once and sliced per call; concurrent callers
//! share a single in-flight fetch instead of issuing duplicates, and a
//! failed fetch is retried on the next call rather than cached.
//!
//! One resolver is constructed per editing session and discarded with it;
//! cache entries never expire on their own.

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::SchemaResult;
use super::types::{ColumnSchema, DatabaseSchema, Schema, TableSchema};

/// Supplier of the full schema document
///
/// Implemented by the ADX client; tests substitute in-memory sources.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch_schema(&self) -> SchemaResult<Schema>;
}

type SharedFetch = Shared<BoxFuture<'static, SchemaResult<Arc<Schema>>>>;

/// Cache slot for the schema document
enum FetchSlot {
    /// Nothing fetched yet, or the last fetch failed
    Empty,
    /// A fetch is in flight; later callers attach to it
    Pending { generation: u64, fetch: SharedFetch },
    /// The document is cached for the resolver's lifetime
    Ready(Arc<Schema>),
}

/// Caching, de-duplicating view over a [`SchemaSource`]
pub struct SchemaResolver {
    source: Arc<dyn SchemaSource>,
    slot: Mutex<FetchSlot>,
    generation: AtomicU64,
}

impl SchemaResolver {
    /// Create a resolver for one editing session
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            slot: Mutex::new(FetchSlot::Empty),
            generation: AtomicU64::new(0),
        }
    }

    /// All databases in the cluster, sorted by name
    pub async fn databases(&self) -> SchemaResult<Vec<DatabaseSchema>> {
        let schema = self.document().await?;

        let mut databases: Vec<DatabaseSchema> = schema.databases.values().cloned().collect();
        databases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(databases)
    }

    /// Regular and external tables of a database, sorted by name
    ///
    /// An unknown database yields an empty list: the caller may hold a
    /// stale selection, which is not an error state for the editor.
    pub async fn tables(&self, database: &str) -> SchemaResult<Vec<TableSchema>> {
        let schema = self.document().await?;

        let Some(database_schema) = schema.databases.get(database) else {
            tracing::warn!(database = database, "database not present in schema");
            return Ok(Vec::new());
        };

        let mut tables: Vec<TableSchema> = database_schema.all_tables().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    /// Columns of a table, in schema order
    ///
    /// Unknown database or table names yield an empty list, like
    /// [`SchemaResolver::tables`].
    pub async fn columns(&self, database: &str, table: &str) -> SchemaResult<Vec<ColumnSchema>> {
        let schema = self.document().await?;

        let table_schema = schema.databases.get(database).and_then(|database_schema| {
            database_schema
                .tables
                .get(table)
                .or_else(|| database_schema.external_tables.get(table))
        });

        match table_schema {
            Some(table_schema) => Ok(table_schema.ordered_columns.clone()),
            None => {
                tracing::warn!(
                    database = database,
                    table = table,
                    "table not present in schema"
                );
                Ok(Vec::new())
            }
        }
    }

    /// The cached schema document, fetching it on first use
    ///
    /// Exactly one fetch is outstanding at a time; every concurrent caller
    /// awaits the same shared future and receives the same result.
    async fn document(&self) -> SchemaResult<Arc<Schema>> {
        let (generation, fetch) = {
            let mut slot = self.slot.lock().await;
            match &*slot {
                FetchSlot::Ready(schema) => return Ok(schema.clone()),
                FetchSlot::Pending { generation, fetch } => (*generation, fetch.clone()),
                FetchSlot::Empty => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let source = self.source.clone();
                    let fetch: SharedFetch =
                        async move { source.fetch_schema().await.map(Arc::new) }
                            .boxed()
                            .shared();

                    tracing::debug!(generation = generation, "fetching schema document");
                    *slot = FetchSlot::Pending {
                        generation,
                        fetch: fetch.clone(),
                    };
                    (generation, fetch)
                }
            }
        };

        let result = fetch.await;

        // First waiter back transitions the slot; the generation guard
        // keeps a late waiter of a dead fetch from clobbering a newer one.
        let mut slot = self.slot.lock().await;
        if let FetchSlot::Pending {
            generation: current, ..
        } = &*slot
        {
            if *current == generation {
                *slot = match &result {
                    Ok(schema) => FetchSlot::Ready(schema.clone()),
                    Err(error) => {
                        tracing::warn!(error = %error, "schema fetch failed");
                        FetchSlot::Empty
                    }
                };
            }
        }

        result
    }
}
