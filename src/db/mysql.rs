//! MySQL / MariaDB database client implementation.

use crate::config::ConnectionConfig;
use crate::db::{normalize_url, DatabaseClient, Row, RowSet, Value};
use crate::error::{QueryDeskError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, Executor, MySql, Row as SqlxRow, Statement};
use sqlx::{TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::debug;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    conn: Option<MySqlConnection>,
}

impl MySqlClient {
    /// Opens a connection using the config's URL and credentials.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        // sqlx only understands the mysql:// scheme
        let url = normalize_url(config.url());
        let url = match url.strip_prefix("mariadb:") {
            Some(rest) => format!("mysql:{rest}"),
            None => url.to_string(),
        };

        let mut options = MySqlConnectOptions::from_str(&url)
            .map_err(|e| QueryDeskError::connection_failed(format!("invalid URL: {e}")))?
            .username(config.username());
        if !config.password().is_empty() {
            options = options.password(config.password());
        }

        let conn = options
            .connect()
            .await
            .map_err(|e| QueryDeskError::connection_failed(e.to_string()))?;

        debug!("Successfully connected to MySQL");
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.conn.as_mut().ok_or(QueryDeskError::ConnectionInvalid)
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
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
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return Value::Null;
    }

    let type_name = type_name.to_uppercase();
    let unsigned = type_name.ends_with("UNSIGNED");

    match type_name.trim_end_matches(" UNSIGNED") {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" if unsigned => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DECIMAL" => row
            .try_get::<Option<sqlx::types::Decimal>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "DATETIME" | "TIMESTAMP" => row
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

        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
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
