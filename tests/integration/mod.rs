//! Integration tests for QueryDesk.

pub mod config_test;
pub mod executor_test;
pub mod postgres_test;
pub mod session_test;

use querydesk::config::ConnectionConfig;
use querydesk::connection::{self, Connection};

/// Opens a fresh in-memory SQLite database.
pub async fn memory_connection(conn_id: i64) -> Connection {
    let config = ConnectionConfig::new(
        conn_id,
        "memory",
        "sqlite::memory:",
        "tester",
        "",
        "org.sqlite.JDBC",
    )
    .unwrap();
    connection::open(config).await.unwrap()
}
