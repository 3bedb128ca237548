//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using a single sqlx connection.

use crate::config::ConnectionConfig;
use crate::db::{normalize_url, DatabaseClient, Row, RowSet, Value};
use crate::error::{QueryDeskError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, Executor, Postgres, Row as SqlxRow, Statement};
use sqlx::{TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::debug;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a connection using the config's URL and credentials.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut options = PgConnectOptions::from_str(normalize_url(config.url()))
            .map_err(|e| QueryDeskError::connection_failed(format!("invalid URL: {e}")))?
            .username(config.username());
        if !config.password().is_empty() {
            options = options.password(config.password());
        }

        let conn = options
            .connect()
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to PostgreSQL");
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn.as_mut().ok_or(QueryDeskError::ConnectionInvalid)
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn fetch_rows(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let conn = self.conn()?;

        let statement = (&mut *conn).prepare(sql).await.map_err(map_query_error)?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let mut query = statement.query();
        for param in params {
            query = bind_value(query, param);
        }

        let mut rows = Vec::new();
        let mut stream = query.fetch(&mut *conn);
        while let Some(row) = stream.try_next().await.map_err(map_query_error)? {
            rows.push(convert_row(&row));
        }

        Ok(RowSet::new(columns, rows))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let conn = self.conn()?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }
        let result = query.execute(&mut *conn).await;

        Ok(result.map_err(map_query_error)?.rows_affected())
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn()?.ping().await.map_err(QueryDeskError::from)
    }

    async fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(QueryDeskError::ConnectionInvalid)?;
        conn.close().await.map_err(QueryDeskError::from)
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

/// Binds one positional parameter.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return Value::Null;
    }

    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "NUMERIC" => row
            .try_get::<Option<sqlx::types::Decimal>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMPTZ" => row
            .try_get::<Option<sqlx::types::chrono::DateTime<sqlx::types::chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<sqlx::types::chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<sqlx::types::chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<sqlx::types::chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // For all other types, try to get as string
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> QueryDeskError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        QueryDeskError::connection_failed(format!(
            "authentication failed for user '{}'",
            config.username()
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        QueryDeskError::connection_failed(error.to_string())
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        QueryDeskError::connection_failed(
            "server requires SSL. Add '?sslmode=require' to the URL".to_string(),
        )
    } else {
        QueryDeskError::connection_failed(error.to_string())
    }
}

/// Maps a statement error, keeping PostgreSQL's detail and hint lines.
fn map_query_error(error: sqlx::Error) -> QueryDeskError {
    if error.as_database_error().is_some() {
        QueryDeskError::execution(format_query_error(&error))
    } else {
        error.into()
    }
}

/// Formats a query error with hints if available.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = db_error.message().to_string();

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }

        if let Some(column) = pg_error.column() {
            result.push_str("\n  COLUMN: ");
            result.push_str(column);
        }

        if let Some(constraint) = pg_error.constraint() {
            result.push_str("\n  CONSTRAINT: ");
            result.push_str(constraint);
        }
    }

    result
}
