//! Statement module - a prepared statement scoped to the function that uses it

use rusqlite::{params_from_iter, CachedStatement, Connection};
use tracing::debug;

use super::row::read_row;
use super::SqlValue;
use crate::error::Result;
use crate::models::{QueryResult, ResultSet};

/// Prepared SQL statement borrowed from a connection.
///
/// Dropping it returns the compiled statement to the connection's cache.
pub struct Statement<'c> {
    sql: String,
    conn: &'c Connection,
    stmt: CachedStatement<'c>,
}

impl<'c> Statement<'c> {
    /// Prepare `sql` on `conn` (internal use)
    pub(crate) fn new(conn: &'c Connection, sql: &str) -> Result<Self> {
        let stmt = conn.prepare_cached(sql)?;
        Ok(Statement {
            sql: sql.to_string(),
            conn,
            stmt,
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Whether the statement leaves the database unchanged
    pub fn readonly(&self) -> bool {
        self.stmt.readonly()
    }

    /// Execute with positional values and report the affected rows
    pub fn run(&mut self, params: &[SqlValue]) -> Result<QueryResult> {
        debug!(sql = %self.sql, params = params.len(), "executing statement");
        let changes = self.stmt.execute(params_from_iter(params.iter()))?;

        Ok(QueryResult {
            changes,
            last_insert_rowid: self.conn.last_insert_rowid(),
        })
    }

    /// Execute query and return every row with the column names
    pub fn all(&mut self, params: &[SqlValue]) -> Result<ResultSet> {
        let columns = self.column_names();
        let rows = self.values(params)?;
        Ok(ResultSet { columns, rows })
    }

    /// Execute query and return the first row, if any
    pub fn get(&mut self, params: &[SqlValue]) -> Result<Option<Vec<SqlValue>>> {
        debug!(sql = %self.sql, params = params.len(), "executing query");
        let column_count = self.stmt.column_count();
        let mut rows = self.stmt.query(params_from_iter(params.iter()))?;

        match rows.next()? {
            Some(row) => Ok(Some(read_row(row, column_count)?)),
            None => Ok(None),
        }
    }

    /// Execute query and return all rows as value arrays
    pub fn values(&mut self, params: &[SqlValue]) -> Result<Vec<Vec<SqlValue>>> {
        debug!(sql = %self.sql, params = params.len(), "executing query");
        let column_count = self.stmt.column_count();
        let mut rows = self.stmt.query(params_from_iter(params.iter()))?;

        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(read_row(row, column_count)?);
        }

        Ok(results)
    }
}
