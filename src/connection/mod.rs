//! Connection management for QueryDesk.
//!
//! A [`Connection`] owns exactly one live database handle together with the
//! config used to open it. Connections are created by the factory functions
//! in this module.

mod factory;
mod handle;

pub use factory::{open, open_mysql, open_postgres, open_sqlite};
pub use handle::{Connection, LIVENESS_TIMEOUT};
