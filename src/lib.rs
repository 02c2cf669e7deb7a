//! DDL and DML helper over a single SQLite connection.
//!
//! [`Operations`] creates databases and tables, runs inserts (single and
//! batched), updates, deletes, queries and callable statements, and returns
//! structured results. [`format`] renders those results as console text.

pub mod config;
pub mod db;
mod error;
pub mod format;
mod models;
#[cfg(feature = "node")]
pub mod node;
mod operations;
pub mod sql;

pub use config::ConnectionConfig;
pub use db::{Database, SqlValue, Statement, Transaction, TransactionMode};
pub use error::{OperationsError, Result};
pub use models::{BatchResult, ColumnInfo, QueryResult, ResultSet};
pub use operations::Operations;
pub use sql::StatementKind;

/// Version of the bundled SQLite library
pub fn get_sqlite_version() -> String {
    rusqlite::version().to_string()
}
