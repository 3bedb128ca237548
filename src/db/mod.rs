//! Database abstraction layer for QueryDesk.
//!
//! Provides a trait-based interface over a single live database handle, and
//! an explicit registry of the drivers QueryDesk can open.

mod mock;
mod mysql;
mod postgres;
mod sqlite;
mod types;

pub use mock::{MockDatabaseClient, MockLog};
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{Row, RowSet, Value};

use crate::config::ConnectionConfig;
use crate::error::{QueryDeskError, Result};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Upper bound on the driver handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Postgres,
    MySql,
    Sqlite,
}

impl DriverKind {
    /// Every registered driver.
    pub const ALL: [DriverKind; 3] = [Self::Postgres, Self::MySql, Self::Sqlite];

    /// Returns the canonical short name of the driver.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Resolves a driver identifier.
    ///
    /// Accepts short names as well as the JDBC class names users tend to
    /// paste from other tools.
    pub fn resolve(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "org.postgresql.driver" => Some(Self::Postgres),
            "mysql" | "mariadb" | "com.mysql.cj.jdbc.driver" | "com.mysql.jdbc.driver"
            | "org.mariadb.jdbc.driver" => Some(Self::MySql),
            "sqlite" | "sqlite3" | "org.sqlite.jdbc" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Infers the driver from a connection URL's scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = normalize_url(url);
        let (scheme, _) = url.split_once(':')?;
        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the display name used by the convenience factories.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strips a leading `jdbc:` prefix so JDBC-style URLs reach sqlx intact.
pub fn normalize_url(url: &str) -> &str {
    let trimmed = url.trim();
    match trimmed.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("jdbc:") => &trimmed[5..],
        _ => trimmed,
    }
}

/// Opens a client for the given driver.
///
/// The handshake is bounded by [`CONNECT_TIMEOUT`]; every failure is
/// reported as [`QueryDeskError::ConnectionFailed`].
pub async fn open_client(
    kind: DriverKind,
    config: &ConnectionConfig,
) -> Result<Box<dyn DatabaseClient>> {
    debug!("Opening {} client for {}", kind, config.display_string());

    let connect = async {
        let client: Box<dyn DatabaseClient> = match kind {
            DriverKind::Postgres => Box::new(PostgresClient::connect(config).await?),
            DriverKind::MySql => Box::new(MySqlClient::connect(config).await?),
            DriverKind::Sqlite => Box::new(SqliteClient::connect(config).await?),
        };
        Ok::<_, QueryDeskError>(client)
    };

    tokio::time::timeout(CONNECT_TIMEOUT, connect)
        .await
        .map_err(|_| {
            QueryDeskError::connection_failed(format!(
                "handshake timed out after {} seconds",
                CONNECT_TIMEOUT.as_secs()
            ))
        })?
}

/// Interface over one live database handle.
///
/// Methods take `&mut self`: a handle runs at most one statement at a time.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Runs a row-returning statement and reads every row.
    async fn fetch_rows(&mut self, sql: &str, params: &[Value]) -> Result<RowSet>;

    /// Runs a statement that does not return rows, returning the affected row count.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Round-trips to the server to check the handle is usable.
    async fn ping(&mut self) -> Result<()>;

    /// Closes the handle. Closing twice is an error.
    async fn close(&mut self) -> Result<()>;

    /// Returns true once the handle has been closed.
    fn is_closed(&self) -> bool;
}
