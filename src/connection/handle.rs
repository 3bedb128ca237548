//! The live connection wrapper.

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::db::{DatabaseClient, DriverKind};
use crate::error::Result;

/// Upper bound on the liveness probe.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

/// An open database connection with its metadata.
///
/// `is_active()` is true until [`Connection::close`] has run.
pub struct Connection {
    config: ConnectionConfig,
    client: Box<dyn DatabaseClient>,
    connected_at: DateTime<Local>,
    active: bool,
}

impl Connection {
    /// Wraps an already-open client, stamping the connect time as now.
    pub fn from_client(config: ConnectionConfig, client: Box<dyn DatabaseClient>) -> Self {
        Self {
            config,
            client,
            connected_at: Local::now(),
            active: true,
        }
    }

    /// The config this connection was opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Shorthand for `config().conn_id()`.
    pub fn conn_id(&self) -> i64 {
        self.config.conn_id()
    }

    pub fn connected_at(&self) -> DateTime<Local> {
        self.connected_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The resolved driver, if the config names a registered one.
    pub fn driver(&self) -> Option<DriverKind> {
        DriverKind::resolve(self.config.driver())
    }

    /// Checks the handle is open and answers a ping within [`LIVENESS_TIMEOUT`].
    pub async fn is_valid(&mut self) -> bool {
        if !self.active || self.client.is_closed() {
            return false;
        }

        match tokio::time::timeout(LIVENESS_TIMEOUT, self.client.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Liveness probe failed for {}: {}", self.config.name(), e);
                false
            }
            Err(_) => {
                warn!(
                    "Liveness probe for {} timed out after {:?}",
                    self.config.name(),
                    LIVENESS_TIMEOUT
                );
                false
            }
        }
    }

    /// Closes the handle. Does nothing if it is already closed.
    pub async fn close(&mut self) -> Result<()> {
        if !self.active || self.client.is_closed() {
            self.active = false;
            return Ok(());
        }

        let result = self.client.close().await;
        self.active = false;
        info!("Closed connection {}", self.config.display_string());
        result
    }

    pub(crate) fn client_mut(&mut self) -> &mut dyn DatabaseClient {
        self.client.as_mut()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("connected_at", &self.connected_at)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.active {
            debug!(
                "Connection {} dropped without close; the driver will close the socket",
                self.config.name()
            );
        }
    }
}
