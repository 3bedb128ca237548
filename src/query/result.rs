//! Outcome of one execution attempt.

use crate::db::{Row, Value};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Column name used for mutation results.
pub const ROWS_AFFECTED_COLUMN: &str = "Rows Affected";

/// The outcome of one execution attempt: either rows or an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResult {
    Success(QuerySuccess),
    Failure(QueryFailure),
}

/// A statement that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySuccess {
    sql: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    row_count: usize,
    elapsed_ms: u64,
    executed_at: DateTime<Local>,
}

impl QuerySuccess {
    /// Builds a success, stamping the completion time. `row_count` is
    /// derived from `rows`.
    pub fn new(sql: impl Into<String>, columns: Vec<String>, rows: Vec<Row>, elapsed_ms: u64) -> Self {
        let row_count = rows.len();
        Self {
            sql: sql.into(),
            columns,
            rows,
            row_count,
            elapsed_ms,
            executed_at: Local::now(),
        }
    }

    /// Builds the single-cell result of a mutation.
    pub fn rows_affected(sql: impl Into<String>, affected: u64, elapsed_ms: u64) -> Self {
        Self::new(
            sql,
            vec![ROWS_AFFECTED_COLUMN.to_string()],
            vec![vec![Value::from(affected)]],
            elapsed_ms,
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// A statement that was rejected or could not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    sql: String,
    message: String,
    elapsed_ms: u64,
    executed_at: DateTime<Local>,
}

impl QueryFailure {
    /// Builds a failure, stamping the completion time.
    pub fn new(sql: impl Into<String>, message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            sql: sql.into(),
            message: message.into(),
            elapsed_ms,
            executed_at: Local::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl QueryResult {
    /// The SQL text as submitted by the caller.
    pub fn sql(&self) -> &str {
        match self {
            Self::Success(s) => &s.sql,
            Self::Failure(f) => &f.sql,
        }
    }

    /// Wall-clock milliseconds from submission to completion.
    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Success(s) => s.elapsed_ms,
            Self::Failure(f) => f.elapsed_ms,
        }
    }

    /// When the result was finalized.
    pub fn executed_at(&self) -> DateTime<Local> {
        match self {
            Self::Success(s) => s.executed_at,
            Self::Failure(f) => f.executed_at,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error message of a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(&f.message),
        }
    }

    /// Number of rows; 0 for a failure.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Success(s) => s.row_count,
            Self::Failure(_) => 0,
        }
    }

    pub fn columns(&self) -> Option<&[String]> {
        match self {
            Self::Success(s) => Some(&s.columns),
            Self::Failure(_) => None,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Success(s) => Some(&s.rows),
            Self::Failure(_) => None,
        }
    }
}

impl From<QuerySuccess> for QueryResult {
    fn from(success: QuerySuccess) -> Self {
        Self::Success(success)
    }
}

impl From<QueryFailure> for QueryResult {
    fn from(failure: QueryFailure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_row_count_matches_rows() {
        let rows = vec![vec![Value::Int(1)], vec![Value::Int(2)], vec![Value::Null]];
        let result: QueryResult =
            QuerySuccess::new("SELECT x FROM t", vec!["x".to_string()], rows, 4).into();

        assert!(result.is_success());
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.rows().map(|r| r.len()), Some(3));
        assert_eq!(result.error_message(), None);
        assert_eq!(result.elapsed_ms(), 4);
    }

    #[test]
    fn test_rows_affected_shape() {
        let result: QueryResult = QuerySuccess::rows_affected("DELETE FROM t", 0, 1).into();

        assert_eq!(result.columns(), Some(&["Rows Affected".to_string()][..]));
        assert_eq!(result.rows(), Some(&[vec![Value::Int(0)]][..]));
        assert_eq!(result.row_count(), 1);
    }

    #[test]
    fn test_failure_accessors() {
        let result: QueryResult = QueryFailure::new("SELEC 1", "Invalid SQL query", 0).into();

        assert!(!result.is_success());
        assert_eq!(result.sql(), "SELEC 1");
        assert_eq!(result.error_message(), Some("Invalid SQL query"));
        assert_eq!(result.row_count(), 0);
        assert!(result.columns().is_none());
        assert!(result.rows().is_none());
    }

    #[test]
    fn test_duplicate_column_names_preserved() {
        let result = QuerySuccess::new(
            "SELECT 1 AS a, 2 AS a",
            vec!["a".to_string(), "a".to_string()],
            vec![vec![Value::Int(1), Value::Int(2)]],
            0,
        );
        assert_eq!(result.columns(), &["a".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let result: QueryResult = QueryFailure::new("DROP x", "boom", 2).into();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "failure");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["elapsed_ms"], 2);
    }
}
