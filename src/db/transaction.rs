//! Transaction module - scoped transaction bracket over a connection

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use super::{SqlValue, Statement};
use crate::error::Result;
use crate::models::QueryResult;
use crate::sql::quote_identifier;

/// Locking mode used by `BEGIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    fn as_sql(self) -> &'static str {
        match self {
            TransactionMode::Deferred => "DEFERRED",
            TransactionMode::Immediate => "IMMEDIATE",
            TransactionMode::Exclusive => "EXCLUSIVE",
        }
    }
}

/// An open transaction (or savepoint) on a borrowed connection.
///
/// Autocommit is off while the bracket is alive. Dropping it without
/// [`commit`](Transaction::commit) rolls back, so every exit path restores
/// the connection to autocommit mode.
pub struct Transaction<'c> {
    conn: &'c Connection,
    savepoint_name: Option<String>,
    finished: bool,
}

impl<'c> Transaction<'c> {
    /// Begin a transaction (internal use)
    pub(crate) fn begin(conn: &'c Connection, mode: TransactionMode) -> Result<Self> {
        debug!(mode = mode.as_sql(), "begin transaction");
        conn.execute_batch(&format!("BEGIN {}", mode.as_sql()))?;
        Ok(Transaction {
            conn,
            savepoint_name: None,
            finished: false,
        })
    }

    pub fn is_savepoint(&self) -> bool {
        self.savepoint_name.is_some()
    }

    /// Execute a SQL statement within the transaction
    ///
    /// # Arguments
    /// * `sql` - SQL statement to execute
    /// * `params` - Positional values for the statement
    pub fn run(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        debug!(sql, params = params.len(), "executing statement in transaction");
        let changes = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(QueryResult {
            changes,
            last_insert_rowid: self.conn.last_insert_rowid(),
        })
    }

    /// Prepare a statement that runs inside this transaction
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        Statement::new(self.conn, sql)
    }

    /// Commit the transaction, or release the savepoint
    ///
    /// On failure the bracket stays open and is rolled back when dropped.
    pub fn commit(mut self) -> Result<()> {
        match self.savepoint_name {
            Some(ref savepoint) => {
                self.conn
                    .execute_batch(&format!("RELEASE SAVEPOINT {}", savepoint))?;
            }
            None => {
                self.conn.execute_batch("COMMIT")?;
            }
        }
        self.finished = true;
        debug!(savepoint = ?self.savepoint_name, "committed");
        Ok(())
    }

    /// Roll the transaction back, or roll back to and release the savepoint
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.rollback_inner()
    }

    /// Create a savepoint for nested work
    ///
    /// # Arguments
    /// * `name` - Name for the savepoint
    pub fn savepoint(&self, name: &str) -> Result<Transaction<'_>> {
        let name = quote_identifier(name)?;
        self.conn.execute_batch(&format!("SAVEPOINT {}", name))?;
        Ok(Transaction {
            conn: self.conn,
            savepoint_name: Some(name),
            finished: false,
        })
    }

    fn rollback_inner(&self) -> Result<()> {
        match self.savepoint_name {
            Some(ref savepoint) => {
                self.conn
                    .execute_batch(&format!("ROLLBACK TO SAVEPOINT {}", savepoint))?;
                self.conn
                    .execute_batch(&format!("RELEASE SAVEPOINT {}", savepoint))?;
            }
            None => {
                self.conn.execute_batch("ROLLBACK")?;
            }
        }
        debug!(savepoint = ?self.savepoint_name, "rolled back");
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(savepoint = ?self.savepoint_name, "transaction dropped without commit, rolling back");
        if let Err(e) = self.rollback_inner() {
            warn!(error = %e, "rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit() {
        let conn = conn();
        let tx = Transaction::begin(&conn, TransactionMode::Immediate).unwrap();
        assert!(!conn.is_autocommit());
        tx.run("INSERT INTO t VALUES (?1)", &[SqlValue::Integer(1)])
            .unwrap();
        tx.commit().unwrap();
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let conn = conn();
        {
            let tx = Transaction::begin(&conn, TransactionMode::Deferred).unwrap();
            tx.run("INSERT INTO t VALUES (1)", &[]).unwrap();
        }
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_savepoint_rollback_keeps_outer_work() {
        let conn = conn();
        let tx = Transaction::begin(&conn, TransactionMode::Deferred).unwrap();
        tx.run("INSERT INTO t VALUES (1)", &[]).unwrap();
        {
            let sp = tx.savepoint("inner").unwrap();
            assert!(sp.is_savepoint());
            sp.run("INSERT INTO t VALUES (2)", &[]).unwrap();
            sp.rollback().unwrap();
        }
        tx.commit().unwrap();
        assert_eq!(count(&conn), 1);
    }
}
