//! Error type shared by every operation of the crate.

use thiserror::Error;

use crate::sql::StatementKind;

/// Errors returned by [`Operations`](crate::Operations) and the connection layer.
#[derive(Debug, Error)]
pub enum OperationsError {
    /// The driver rejected the call (bad SQL, constraint violation, I/O, ...).
    #[error("SQLite Error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The SQL text does not start with the keyword of the requested operation.
    #[error("expected a {expected} statement, got: {sql}")]
    InvalidStatementKind { expected: StatementKind, sql: String },

    /// Batched inserts were requested on a connection that does not allow them.
    #[error("this database does not support batch updates")]
    BatchUnsupported,

    /// Table, column or database name that cannot be used as an identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("column list is empty")]
    EmptyColumns,

    /// A batch row does not have one value per column.
    #[error("row {row} has {found} values but {expected} columns were given")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Callable statement not written in `{ ? = call name(...) }` form.
    #[error("invalid callable statement: {0}")]
    InvalidCall(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = OperationsError> = std::result::Result<T, E>;

#[cfg(feature = "node")]
pub fn to_napi_error(err: OperationsError) -> napi::Error {
    napi::Error::from_reason(err.to_string())
}
