//! SQLite database client implementation.
//!
//! SQLite has no server-side users, so the config's credentials are ignored.
//! Values are decoded by their storage class rather than the declared column
//! type, since expressions such as `SELECT 1` carry no declared type.

use crate::config::ConnectionConfig;
use crate::db::{normalize_url, DatabaseClient, Row, RowSet, Value};
use crate::error::{QueryDeskError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row as SqlxRow, Sqlite, Statement};
use sqlx::{TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    conn: Option<SqliteConnection>,
}

impl SqliteClient {
    /// Opens (creating if missing) the database named by the config's URL.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(normalize_url(config.url()))
            .map_err(|e| QueryDeskError::connection_failed(format!("invalid URL: {e}")))?
            .create_if_missing(true);

        let conn = options
            .connect()
            .await
            .map_err(|e| QueryDeskError::connection_failed(e.to_string()))?;

        debug!("Opened SQLite database {}", config.url());
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn.as_mut().ok_or(QueryDeskError::ConnectionInvalid)
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn fetch_rows(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let conn = self.conn()?;

        let statement = (&mut *conn).prepare(sql).await?;
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
        while let Some(row) = stream.try_next().await? {
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
        let result = query.execute(&mut *conn).await?;

        Ok(result.rows_affected())
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

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single value according to its storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
