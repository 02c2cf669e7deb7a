//! Row module - utilities for reading SQLite rows

use rusqlite::Row;

use super::SqlValue;

/// Read column `i` of a row as an owned value
///
/// # Arguments
/// * `row` - Reference to the SQLite row
/// * `i` - Column index
pub fn read_value(row: &Row<'_>, i: usize) -> rusqlite::Result<SqlValue> {
    Ok(SqlValue::from_value_ref(row.get_ref(i)?))
}

/// Read every column of a row, in column order
pub fn read_row(row: &Row<'_>, column_count: usize) -> rusqlite::Result<Vec<SqlValue>> {
    (0..column_count).map(|i| read_value(row, i)).collect()
}

