//! Error types for QueryDesk.
//!
//! Every failure the core can produce maps onto one of these variants. The
//! executor and the connection factory convert them into result values, so
//! none of them escape to the presentation layer as a panic.

use thiserror::Error;

/// Main error type for QueryDesk operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryDeskError {
    /// Empty, too short, or unclassifiable SQL.
    #[error("{0}")]
    Validation(String),

    /// The liveness probe failed before a statement could run.
    #[error("Database connection is not valid")]
    ConnectionInvalid,

    /// The driver identifier in a connection config could not be resolved.
    #[error("Database driver not found: {0}")]
    DriverNotFound(String),

    /// The driver rejected the handshake (host unreachable, auth failed, etc.)
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// The driver rejected a statement at run time.
    #[error("Database error: {0}")]
    Execution(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything not covered above.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl QueryDeskError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a driver-not-found error naming the identifier.
    pub fn driver_not_found(id: impl Into<String>) -> Self {
        Self::DriverNotFound(id.into())
    }

    /// Creates a connection-failed error wrapping the underlying cause.
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    /// Creates an execution error carrying the driver's message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an unexpected error with the given message.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::ConnectionInvalid => "Connection Invalid",
            Self::DriverNotFound(_) => "Driver Not Found",
            Self::ConnectionFailed(_) => "Connection Failed",
            Self::Execution(_) => "Execution Error",
            Self::Config(_) => "Configuration Error",
            Self::Unexpected(_) => "Unexpected Error",
        }
    }
}

impl From<sqlx::Error> for QueryDeskError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_error) => Self::Execution(db_error.message().to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. } => Self::Execution(error.to_string()),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

/// Result type alias using QueryDeskError.
pub type Result<T> = std::result::Result<T, QueryDeskError>;
