//! Database module - SQLite connection, statements, transactions and values

mod database;
mod params;
mod row;
mod statement;
mod transaction;
mod value;

pub use database::Database;
pub use params::{convert_params, convert_rows, convert_single_param};
pub use row::{read_row, read_value};
pub use statement::Statement;
pub use transaction::{Transaction, TransactionMode};
pub use value::SqlValue;
