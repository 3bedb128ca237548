//! Query handling for QueryDesk.
//!
//! Classification and sanitizing are pure text operations; the executor
//! combines them with a [`Connection`](crate::connection::Connection) to
//! produce a [`QueryResult`].

pub mod classifier;
pub mod executor;
pub mod result;
pub mod sanitizer;

pub use classifier::{classify, is_read_only, is_valid_query, StatementKind, MIN_QUERY_LEN};
pub use executor::{QueryExecutor, INVALID_QUERY_MESSAGE};
pub use result::{QueryFailure, QueryResult, QuerySuccess, ROWS_AFFECTED_COLUMN};
pub use sanitizer::{sanitize, sanitize_opt};
