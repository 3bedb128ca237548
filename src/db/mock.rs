//! Mock database client for testing.
//!
//! Provides a scripted in-memory client so the executor and session can be
//! exercised without a database server.

use super::{DatabaseClient, RowSet, Value};
use crate::error::{QueryDeskError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared log of every statement the mock received, with its bound parameters.
#[derive(Debug, Clone, Default)]
pub struct MockLog(Arc<Mutex<Vec<(String, Vec<Value>)>>>);

impl MockLog {
    /// Returns the statements received so far, oldest first.
    pub fn statements(&self) -> Vec<String> {
        self.entries().into_iter().map(|(sql, _)| sql).collect()
    }

    /// Returns the statements together with their parameters.
    pub fn entries(&self) -> Vec<(String, Vec<Value>)> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn push(&self, sql: &str, params: &[Value]) {
        if let Ok(mut log) = self.0.lock() {
            log.push((sql.to_string(), params.to_vec()));
        }
    }
}

/// A mock database client that returns predefined results.
///
/// Unscripted row-returning statements yield a single `result` column
/// echoing the SQL; unscripted mutations report `affected` rows.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    row_sets: HashMap<String, RowSet>,
    errors: HashMap<String, String>,
    affected: u64,
    unhealthy: bool,
    hanging: bool,
    closed: bool,
    log: MockLog,
}

impl MockDatabaseClient {
    /// Creates a new mock database client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the row set returned for an exact statement.
    pub fn with_rows(mut self, sql: impl Into<String>, rows: RowSet) -> Self {
        self.row_sets.insert(sql.into(), rows);
        self
    }

    /// Scripts a driver error for an exact statement.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.insert(sql.into(), message.into());
        self
    }

    /// Sets the affected row count reported by mutations.
    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    /// Makes every liveness probe fail.
    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Makes every liveness probe wait forever.
    pub fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    /// Returns a handle to the statement log.
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    fn check(&self, sql: &str) -> Result<()> {
        if self.closed {
            return Err(QueryDeskError::ConnectionInvalid);
        }
        match self.errors.get(sql) {
            Some(message) => Err(QueryDeskError::execution(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn fetch_rows(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        self.log.push(sql, params);
        self.check(sql)?;

        Ok(self.row_sets.get(sql).cloned().unwrap_or_else(|| {
            RowSet::new(
                vec!["result".to_string()],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )
        }))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.log.push(sql, params);
        self.check(sql)?;
        Ok(self.affected)
    }

    async fn ping(&mut self) -> Result<()> {
        if self.hanging {
            std::future::pending::<()>().await;
        }
        if self.closed || self.unhealthy {
            return Err(QueryDeskError::execution("connection reset by peer"));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(QueryDeskError::ConnectionInvalid);
        }
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
