//! Query execution with statement classification.
//!
//! The executor validates, sanitizes and classifies a statement, picks the
//! row-returning or the mutation path, and always produces a timed
//! [`QueryResult`]. Driver errors become `Failure` values; nothing is
//! propagated to the caller.

use std::time::Instant;

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::db::Value;
use crate::error::{QueryDeskError, Result};
use crate::query::classifier::{classify, is_valid_query, StatementKind};
use crate::query::result::{QueryFailure, QueryResult, QuerySuccess};
use crate::query::sanitizer::sanitize;

/// Message of the validation failure for unusable SQL text.
pub const INVALID_QUERY_MESSAGE: &str = "Invalid SQL query";

/// Runs statements against one connection.
pub struct QueryExecutor<'a> {
    connection: &'a mut Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(connection: &'a mut Connection) -> Self {
        Self { connection }
    }

    /// Validates, sanitizes and runs a literal SQL statement.
    pub async fn execute(&mut self, sql: &str) -> QueryResult {
        let start = Instant::now();

        if !is_valid_query(sql) {
            debug!("Rejected statement: {:?}", sql);
            return failure(sql, QueryDeskError::validation(INVALID_QUERY_MESSAGE), start);
        }

        let sanitized = sanitize(sql);

        if !self.connection.is_valid().await {
            return failure(sql, QueryDeskError::ConnectionInvalid, start);
        }

        let outcome = self.run(&sanitized, &[]).await;
        finish(sql, outcome, start)
    }

    /// Runs a statement with positional bind values.
    ///
    /// The SQL text is neither validated nor sanitized; the caller owns it.
    pub async fn execute_parameterized(&mut self, sql: &str, params: &[Value]) -> QueryResult {
        let start = Instant::now();

        if !self.connection.is_valid().await {
            return failure(sql, QueryDeskError::ConnectionInvalid, start);
        }

        let outcome = self.run(sql, params).await;
        finish(sql, outcome, start)
    }

    async fn run(&mut self, sql: &str, params: &[Value]) -> Result<Outcome> {
        let kind = classify(sql);
        debug!("Executing {} statement ({} params)", kind, params.len());

        let client = self.connection.client_mut();
        match kind {
            StatementKind::Select => {
                let row_set = client.fetch_rows(sql, params).await?;
                Ok(Outcome::Rows {
                    columns: row_set.columns,
                    rows: row_set.rows,
                })
            }
            _ => {
                let affected = client.execute(sql, params).await?;
                Ok(Outcome::Affected(affected))
            }
        }
    }
}

/// What a statement produced, before timing is attached.
enum Outcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<crate::db::Row>,
    },
    Affected(u64),
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn finish(sql: &str, outcome: Result<Outcome>, start: Instant) -> QueryResult {
    match outcome {
        Ok(Outcome::Rows { columns, rows }) => {
            QuerySuccess::new(sql, columns, rows, elapsed_ms(start)).into()
        }
        Ok(Outcome::Affected(affected)) => {
            QuerySuccess::rows_affected(sql, affected, elapsed_ms(start)).into()
        }
        Err(e) => {
            warn!("Statement failed ({}): {}", e.category(), e);
            failure(sql, e, start)
        }
    }
}

fn failure(sql: &str, error: QueryDeskError, start: Instant) -> QueryResult {
    QueryFailure::new(sql, error.to_string(), elapsed_ms(start)).into()
}
