//! QueryDesk - SQL query handling over a single database connection.
//!
//! Statements are classified, sanitized and executed through a
//! [`connection::Connection`], producing [`query::QueryResult`] values that
//! are recorded by the [`history::HistoryTracker`]. The [`session`] actor
//! ties these together for the shell.

pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod history;
pub mod logging;
pub mod query;
pub mod render;
pub mod session;
