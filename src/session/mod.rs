//! Query editing session
//!
//! One [`QuerySession`] exists per query being edited. It owns the host's
//! query object, the resolver for cluster metadata, and the current
//! table's columns. Every edit rebuilds the expression tree with the
//! changed node replaced, then recompiles the KQL projection (unless the
//! session is in raw mode, where the user edits text directly and the
//! compiler is bypassed).
//!
//! # Edit flow
//!
//! ```text
//! edit → normalize node → replace in tree → (fetch columns) → compile → query text
//! ```

use std::sync::Arc;

use crate::expr::{
    ArrayExpression, Expression, GroupByExpression, KustoQuery, Property, PropertyExpression,
    PropertyType, QueryExpression, ResultFormat,
};
use crate::kql;
use crate::schema::{first_datetime_column, ColumnSchema, SchemaResolver, SchemaResult};
use crate::transport::{QueryTransport, TableResult, TransportError};

/// Stateful editor for one query
pub struct QuerySession {
    resolver: Arc<SchemaResolver>,
    query: KustoQuery,
    columns: Vec<ColumnSchema>,
    dirty: bool,
    last_error: Option<String>,
}

impl QuerySession {
    /// Start editing a (possibly saved) query
    ///
    /// A saved query with hand-written text but no source table opens in
    /// raw mode, matching how it was authored.
    pub fn new(resolver: Arc<SchemaResolver>, mut query: KustoQuery) -> Self {
        if !query.raw_mode && !query.query.is_empty() && query.expression.from.is_none() {
            query.raw_mode = true;
        }

        Self {
            resolver,
            query,
            columns: Vec::new(),
            dirty: false,
            last_error: None,
        }
    }

    /// Resolve initial metadata: default database, current table's columns
    ///
    /// A schema failure leaves the session editable; the error is recorded
    /// and the call can be repeated.
    pub async fn initialize(&mut self) -> SchemaResult<()> {
        if self.query.database.is_empty() {
            let result = self.resolver.databases().await;
            let databases = self.record(result)?;
            if let Some(first) = databases.first() {
                self.query.database = first.name.clone();
            }
        }

        if let Some(table) = self.query.expression.table().map(str::to_string) {
            let result = self.resolver.columns(&self.query.database, &table).await;
            self.columns = self.record(result)?;
        }

        self.verify_group_by_time();
        self.recompile();
        Ok(())
    }

    /// The query object in its current state
    pub fn query(&self) -> &KustoQuery {
        &self.query
    }

    /// Columns of the currently selected table
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Whether the query changed since it last ran
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// The most recent schema or execution error, verbatim
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Select the source table
    ///
    /// Switching tables invalidates filter and aggregation choices built
    /// against the old table's columns, so the three sections reset to
    /// empty. Re-selecting the same table only refreshes the columns.
    pub async fn set_from(&mut self, table: Property) -> SchemaResult<()> {
        let same_table = self.query.expression.table() == Some(table.name.as_str());

        if !same_table {
            self.query.expression = QueryExpression {
                from: Some(PropertyExpression::new(table.clone())),
                ..Default::default()
            };
        } else {
            self.query.expression.from = Some(PropertyExpression::new(table.clone()));
        }

        let result = self
            .resolver
            .columns(&self.query.database, &table.name)
            .await;

        match self.record(result) {
            Ok(columns) => self.columns = columns,
            Err(error) => {
                self.columns.clear();
                self.recompile();
                return Err(error);
            }
        }

        self.verify_group_by_time();
        self.recompile();
        Ok(())
    }

    /// Replace the filter section
    pub fn set_where(&mut self, where_clause: ArrayExpression) {
        self.query.expression.where_clause = where_clause;
        self.recompile();
    }

    /// Replace the aggregation section
    pub fn set_reduce(&mut self, reduce: ArrayExpression) {
        self.query.expression.reduce = reduce;
        self.recompile();
    }

    /// Replace the group-by section
    pub fn set_group_by(&mut self, group_by: ArrayExpression) {
        self.query.expression.group_by = group_by;
        self.recompile();
    }

    /// Switch the target database
    pub fn set_database(&mut self, database: impl Into<String>) {
        self.query.database = database.into();
        self.recompile();
    }

    /// Switch between time-series and table shaping
    pub fn set_result_format(&mut self, format: ResultFormat) {
        self.query.result_format = format;
        self.verify_group_by_time();
        self.recompile();
    }

    /// Update the series naming pattern
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        self.query.alias = if alias.is_empty() { None } else { Some(alias) };
        self.dirty = true;
    }

    /// Replace the query text directly (raw mode)
    pub fn set_raw_query(&mut self, text: impl Into<String>) {
        self.query.query = text.into();
        self.dirty = true;
    }

    /// Toggle raw mode
    ///
    /// Leaving raw mode recompiles the visual expression over whatever
    /// text was written by hand.
    pub fn toggle_raw_mode(&mut self) {
        self.query.raw_mode = !self.query.raw_mode;
        if !self.query.raw_mode {
            self.verify_group_by_time();
        }
        self.recompile();
    }

    /// Query text that lists candidate values for a filter control
    pub fn suggestion_query(&self, field: &str, typed: Option<&str>) -> Option<String> {
        let table = self.query.expression.table()?;
        kql::suggestion_query(table, field, typed)
    }

    /// Execute the current query text through the transport
    ///
    /// An execution failure becomes the session's last error, verbatim;
    /// the expression tree is left untouched either way.
    pub async fn run(
        &mut self,
        transport: &dyn QueryTransport,
    ) -> Result<TableResult, TransportError> {
        match transport
            .execute(&self.query.query, &self.query.database)
            .await
        {
            Ok(result) => {
                self.dirty = false;
                self.last_error = None;
                Ok(result)
            }
            Err(error) => {
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Inject a default time bucket for time-series queries
    ///
    /// When the result format is time-series, raw mode is off, a table is
    /// selected, and the user supplied no grouping, group by the table's
    /// first datetime column bucketed by the `$__interval` macro. A no-op
    /// when a grouping already exists or the table has no datetime column.
    fn verify_group_by_time(&mut self) {
        if self.query.result_format != ResultFormat::TimeSeries || self.query.raw_mode {
            return;
        }
        if self.query.expression.table().is_none() {
            return;
        }
        if !self.query.expression.group_by.is_empty() {
            return;
        }

        let Some(time_column) = first_datetime_column(&self.columns) else {
            return;
        };

        tracing::debug!(
            column = %time_column.name,
            "injecting default time grouping"
        );

        self.query.expression.group_by = ArrayExpression::and(vec![Expression::GroupBy(
            GroupByExpression::new(Property::new(
                time_column.name.clone(),
                PropertyType::DateTime,
            ))
            .with_interval(Property::interval_macro()),
        )]);
    }

    /// Recompute the derived KQL projection
    fn recompile(&mut self) {
        if !self.query.raw_mode {
            self.query.query = kql::compile(
                &self.query.expression,
                &self.columns,
                &self.query.database,
            );
        }
        self.dirty = true;
    }

    /// Record the outcome of a resolver call as the session error state
    fn record<T>(&mut self, result: SchemaResult<T>) -> SchemaResult<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(error) => {
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }
}
