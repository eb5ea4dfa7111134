//! SQL statement execution.
//!
//! A `Statement` owns one raw query, the placeholders found in it, and the
//! binding and rewrite caches derived from the first successful execution.

use crate::error::{BindingError, QueryError};
use crate::query::binder;
use crate::query::marshal::{self, WireValue};
use crate::query::placeholder::{self, Placeholder, ScanMode};
use crate::query::results::{DatetimeMode, ExecResult, Rows};
use crate::query::rewriter;
use crate::transport::protocol::{ExecuteResponse, StreamId, TransportProtocol};
use crate::types::{check_value, NamedValue};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQL statement bound to one connection or transaction stream.
///
/// Not meant for concurrent reuse: the caches are mutated in place by
/// `execute` and `query`, which take `&mut self`.
pub struct Statement {
    /// Reference to the transport layer
    transport: Arc<Mutex<dyn TransportProtocol>>,
    /// Stream of the enclosing transaction, if any
    stream: Option<StreamId>,
    raw_query: String,
    scan_mode: ScanMode,
    datetime_mode: DatetimeMode,
    placeholders: Option<Vec<Placeholder>>,
    /// Set once binding succeeded
    bound: bool,
    rewritten: Option<String>,
}

impl Statement {
    /// Create a new statement.
    pub fn new(transport: Arc<Mutex<dyn TransportProtocol>>, sql: impl Into<String>) -> Self {
        Self {
            transport,
            stream: None,
            raw_query: sql.into(),
            scan_mode: ScanMode::default(),
            datetime_mode: DatetimeMode::default(),
            placeholders: None,
            bound: false,
            rewritten: None,
        }
    }

    /// Route requests through a transaction stream.
    pub fn with_stream(mut self, stream: Option<StreamId>) -> Self {
        self.stream = stream;
        self
    }

    /// Select how placeholders are recognized.
    pub fn with_scan_mode(mut self, mode: ScanMode) -> Self {
        if mode != self.scan_mode {
            self.scan_mode = mode;
            self.invalidate();
        }
        self
    }

    /// Select how datetime columns are presented in result rows.
    pub fn with_datetime_mode(mut self, mode: DatetimeMode) -> Self {
        self.datetime_mode = mode;
        self
    }

    /// The query text as given by the caller.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// The query text sent to the engine, once a successful bind rewrote it.
    pub fn rewritten_query(&self) -> Option<&str> {
        self.rewritten.as_deref()
    }

    pub fn stream(&self) -> Option<StreamId> {
        self.stream
    }

    /// Placeholders of the raw query, scanning it on first access.
    pub fn placeholders(&mut self) -> &[Placeholder] {
        let mode = self.scan_mode;
        let query = &self.raw_query;
        self.placeholders
            .get_or_insert_with(|| placeholder::scan(query, mode))
            .as_slice()
    }

    /// Number of placeholders in the query.
    pub fn num_input(&mut self) -> usize {
        self.placeholders().len()
    }

    /// Replace the raw query and drop every cache derived from the old one.
    pub fn reset(&mut self, sql: impl Into<String>) {
        self.raw_query = sql.into();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.placeholders = None;
        self.bound = false;
        self.rewritten = None;
    }

    /// Validate, bind, rewrite and marshal `args` for this query.
    ///
    /// Binding and rewriting happen once per statement. Later calls still
    /// check the argument count and value kinds.
    ///
    /// # Errors
    ///
    /// Returns the first `BindingError` hit; nothing is sent in that case.
    pub fn prepare_request(
        &mut self,
        args: &[NamedValue],
    ) -> Result<(String, Vec<WireValue>), BindingError> {
        for arg in args {
            check_value(&arg.value)?;
        }

        let mode = self.scan_mode;
        let query = &self.raw_query;
        let placeholders = self
            .placeholders
            .get_or_insert_with(|| placeholder::scan(query, mode));

        if placeholders.len() != args.len() {
            return Err(BindingError::CountMismatch {
                want: placeholders.len(),
                have: args.len(),
            });
        }

        if !self.bound {
            binder::bind(placeholders, args)?;
            self.bound = true;
        }

        let sql = match &self.rewritten {
            Some(sql) => sql.clone(),
            None => {
                let sql = rewriter::rewrite(&self.raw_query, placeholders);
                self.rewritten = Some(sql.clone());
                sql
            }
        };

        let wire = marshal::marshal(args)?;
        Ok((sql, wire))
    }

    async fn send(&mut self, args: &[NamedValue]) -> Result<ExecuteResponse, QueryError> {
        let (sql, wire) = self.prepare_request(args)?;
        tracing::debug!(sql = %sql, args = wire.len(), stream = ?self.stream, "executing statement");

        let response = {
            let mut transport = self.transport.lock().await;
            transport.execute(&sql, wire, self.stream).await?
        };

        match response.error {
            Some(ref message) if !message.is_empty() => {
                tracing::debug!(error = %message, "engine rejected statement");
                Err(QueryError::Engine(message.clone()))
            }
            _ => Ok(response),
        }
    }

    /// Execute a statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Binding` before any request when the arguments do
    /// not fit the query, `QueryError::Engine` when the engine reports an
    /// error, and `QueryError::Transport` when the round trip fails.
    pub async fn execute(&mut self, args: &[NamedValue]) -> Result<ExecResult, QueryError> {
        let response = self.send(args).await?;
        Ok(ExecResult::from_sql_info(response.sql_info.as_ref()))
    }

    /// Execute a statement and return a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Same as [`Statement::execute`].
    pub async fn query(&mut self, args: &[NamedValue]) -> Result<Rows, QueryError> {
        let response = self.send(args).await?;
        Ok(Rows::from_response(response, self.datetime_mode))
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("raw_query", &self.raw_query)
            .field("stream", &self.stream)
            .field("scan_mode", &self.scan_mode)
            .field("datetime_mode", &self.datetime_mode)
            .field("bound", &self.bound)
            .finish()
    }
}

/// Builder for creating `Statement` instances with a fluent API.
pub struct StatementBuilder {
    transport: Arc<Mutex<dyn TransportProtocol>>,
    sql: Option<String>,
    stream: Option<StreamId>,
    scan_mode: ScanMode,
    datetime_mode: DatetimeMode,
}

impl StatementBuilder {
    /// Create a new statement builder.
    pub fn new(transport: Arc<Mutex<dyn TransportProtocol>>) -> Self {
        Self {
            transport,
            sql: None,
            stream: None,
            scan_mode: ScanMode::default(),
            datetime_mode: DatetimeMode::default(),
        }
    }

    /// Set the SQL text.
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn stream(mut self, stream: Option<StreamId>) -> Self {
        self.stream = stream;
        self
    }

    pub fn scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    pub fn datetime_mode(mut self, mode: DatetimeMode) -> Self {
        self.datetime_mode = mode;
        self
    }

    /// Build the statement.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidState` if SQL text was not set.
    pub fn build(self) -> Result<Statement, QueryError> {
        let sql = self.sql.ok_or_else(|| {
            QueryError::InvalidState("SQL text must be set before building statement".to_string())
        })?;

        Ok(Statement::new(self.transport, sql)
            .with_stream(self.stream)
            .with_scan_mode(self.scan_mode)
            .with_datetime_mode(self.datetime_mode))
    }
}
