//! Connection factory.
//!
//! Resolves the driver named in a config through the [`DriverKind`]
//! registry and performs the handshake.

use std::path::Path;

use tracing::info;

use super::Connection;
use crate::config::ConnectionConfig;
use crate::db::{self, DriverKind};
use crate::error::{QueryDeskError, Result};

/// Opens a connection described by `config`.
///
/// Fails with [`QueryDeskError::DriverNotFound`] if the driver identifier
/// is not registered, or [`QueryDeskError::ConnectionFailed`] if the
/// handshake is rejected.
pub async fn open(config: ConnectionConfig) -> Result<Connection> {
    let kind = DriverKind::resolve(config.driver())
        .ok_or_else(|| QueryDeskError::driver_not_found(config.driver()))?;

    let client = db::open_client(kind, &config).await?;
    info!("Connected to {} via {}", config.display_string(), kind);

    Ok(Connection::from_client(config, client))
}

/// Opens a PostgreSQL connection from its parts.
pub async fn open_postgres(
    host: &str,
    port: u16,
    database: &str,
    username: &str,
    password: &str,
) -> Result<Connection> {
    let url = format!("postgres://{host}:{port}/{database}");
    open(named_config(DriverKind::Postgres, url, username, password)?).await
}

/// Opens a MySQL connection from its parts.
pub async fn open_mysql(
    host: &str,
    port: u16,
    database: &str,
    username: &str,
    password: &str,
) -> Result<Connection> {
    let url = format!("mysql://{host}:{port}/{database}");
    open(named_config(DriverKind::MySql, url, username, password)?).await
}

/// Opens (creating if missing) a SQLite database file.
///
/// SQLite ignores credentials; `username` is only recorded in the config.
pub async fn open_sqlite(path: impl AsRef<Path>, username: &str) -> Result<Connection> {
    let url = format!("sqlite://{}", path.as_ref().display());
    open(named_config(DriverKind::Sqlite, url, username, "")?).await
}

fn named_config(
    kind: DriverKind,
    url: String,
    username: &str,
    password: &str,
) -> Result<ConnectionConfig> {
    ConnectionConfig::new(
        0,
        format!("{} Connection", kind.display_name()),
        url,
        username,
        password,
        kind.as_str(),
    )
}
