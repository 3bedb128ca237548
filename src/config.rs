//! Configuration management for QueryDesk.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named connection profiles. Profiles are the mutable
//! user-input layer; once resolved they become an immutable
//! [`ConnectionConfig`] that is handed to the connection factory.

use crate::db::DriverKind;
use crate::error::{QueryDeskError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Default number of entries kept by the history tracker.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Main configuration structure for QueryDesk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// History tracker settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Named connection profiles.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionProfile>,
}

/// History tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries retained in memory.
    #[serde(default = "default_history_limit")]
    pub max_entries: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_history_limit(),
        }
    }
}

/// A connection profile as written in the config file or given on the CLI.
///
/// Every field is optional so that profiles can be layered; call
/// [`ConnectionProfile::into_config`] to obtain a validated config.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Numeric connection identifier used to tag history entries.
    pub id: Option<i64>,

    /// Connection URL (e.g. `postgres://host:5432/db`, `sqlite::memory:`).
    pub url: Option<String>,

    /// Database user.
    pub username: Option<String>,

    /// Database password (not recommended to store in config).
    pub password: Option<String>,

    /// Driver identifier; inferred from the URL scheme when absent.
    pub driver: Option<String>,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("id", &self.id)
            .field("url", &self.url.as_deref().map(redact_url))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("driver", &self.driver)
            .finish()
    }
}

impl ConnectionProfile {
    /// Merges another profile into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &ConnectionProfile) {
        if other.id.is_some() {
            self.id = other.id;
        }
        if other.url.is_some() {
            self.url = other.url.clone();
        }
        if other.username.is_some() {
            self.username = other.username.clone();
        }
        if other.password.is_some() {
            self.password = other.password.clone();
        }
        if other.driver.is_some() {
            self.driver = other.driver.clone();
        }
    }

    /// Applies environment variables as defaults for unset fields.
    ///
    /// `QUERYDESK_URL` wins over `DATABASE_URL`.
    pub fn apply_env_defaults(&mut self) {
        if self.url.is_none() {
            self.url = std::env::var("QUERYDESK_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .ok();
        }
        if self.username.is_none() {
            self.username = std::env::var("QUERYDESK_USER").ok();
        }
        if self.password.is_none() {
            self.password = std::env::var("QUERYDESK_PASSWORD").ok();
        }
        if self.driver.is_none() {
            self.driver = std::env::var("QUERYDESK_DRIVER").ok();
        }
    }

    /// Returns true if no field has been set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Resolves this profile into an immutable connection config.
    pub fn into_config(self, name: impl Into<String>) -> Result<ConnectionConfig> {
        let url = self
            .url
            .ok_or_else(|| QueryDeskError::config("Connection URL is required"))?;

        let driver = match self.driver {
            Some(driver) => driver,
            None => DriverKind::from_url(&url)
                .map(|kind| kind.as_str().to_string())
                .ok_or_else(|| {
                    QueryDeskError::config(format!(
                        "Cannot infer driver from URL '{}'. Set 'driver' explicitly",
                        redact_url(&url)
                    ))
                })?,
        };

        ConnectionConfig::new(
            self.id.unwrap_or(0),
            name,
            url,
            self.username.unwrap_or_default(),
            self.password.unwrap_or_default(),
            driver,
        )
    }
}

/// Immutable database connection configuration.
///
/// Constructed once from user input and never mutated afterwards.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    conn_id: i64,
    name: String,
    url: String,
    username: String,
    #[serde(skip_serializing)]
    password: String,
    driver: String,
}

impl ConnectionConfig {
    /// Creates a validated connection config.
    ///
    /// The URL and username must be non-empty.
    pub fn new(
        conn_id: i64,
        name: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        driver: impl Into<String>,
    ) -> Result<Self> {
        let url = url.into();
        let username = username.into();

        if url.trim().is_empty() {
            return Err(QueryDeskError::config("Connection URL must not be empty"));
        }
        if username.trim().is_empty() {
            return Err(QueryDeskError::config("Username must not be empty"));
        }

        Ok(Self {
            conn_id,
            name: name.into(),
            url,
            username,
            password: password.into(),
            driver: driver.into(),
        })
    }

    pub fn conn_id(&self) -> i64 {
        self.conn_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Driver identifier as supplied (short name or JDBC-style class name).
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Returns a display-safe string (no password) for UI purposes.
    pub fn display_string(&self) -> String {
        format!("{} ({}@{})", self.name, self.username, redact_url(&self.url))
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("conn_id", &self.conn_id)
            .field("name", &self.name)
            .field("url", &redact_url(&self.url))
            .field("username", &self.username)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

/// Strips any password embedded in a URL.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querydesk")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryDeskError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            QueryDeskError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named profile, or the default profile if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionProfile> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
