//! The data-access helper: DDL and DML operations over one connection.
//!
//! Each operation fixes the kind of statement it will run. Raw SQL handed to
//! [`Operations::insert`], [`Operations::update`], [`Operations::delete`] and
//! [`Operations::select`] must start with that kind's keyword or it is rejected
//! with [`OperationsError::InvalidStatementKind`] before anything executes.
//!
//! ```
//! use sqlite_operations::Operations;
//!
//! let ops = Operations::connect("sqlite::memory:", "shop", "root", "root")?;
//! ops.create_table("products", "id VARCHAR(30), product VARCHAR(13), PRIMARY KEY (id)")?;
//! ops.insert_batch(
//!     "products",
//!     &["id", "product"],
//!     &[vec!["1".into(), "generic".into()], vec!["2".into(), "elite".into()]],
//! )?;
//!
//! let products = ops.select_all_columns("products")?;
//! assert_eq!(products.to_string(), "id product\n1 generic\n2 elite\n");
//! # Ok::<(), sqlite_operations::OperationsError>(())
//! ```

use std::panic::UnwindSafe;

use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::db::{Database, SqlValue, Transaction, TransactionMode};
use crate::error::{OperationsError, Result};
use crate::models::{BatchResult, QueryResult, ResultSet};
use crate::sql::{self, StatementKind};

/// Helper wrapping a single owned connection.
#[derive(Debug)]
pub struct Operations {
    db: Database,
}

impl Operations {
    /// Connect to `url` + `database` with the given credentials.
    ///
    /// # Arguments
    /// * `url` - connector and location prefix, e.g. `sqlite:/var/lib/app/`
    /// * `database` - database name appended to the prefix
    /// * `user` / `password` - credentials for the connection
    pub fn connect(url: &str, database: &str, user: &str, password: &str) -> Result<Self> {
        Self::with_config(ConnectionConfig::new(url, database, user, password))
    }

    pub fn with_config(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::from_database(Database::open(&config)?))
    }

    pub fn from_database(db: Database) -> Self {
        Operations { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ========================================
    // CREATE
    // ========================================

    /// Create the database if it does not exist and make it the current one.
    pub fn create_database(&mut self, database_name: &str) -> Result<()> {
        self.db.use_database(database_name)
    }

    /// Create `table` if it does not exist.
    ///
    /// `column_spec` is passed through as written: columns, types, keys and
    /// constraints, e.g. `"id VARCHAR(30), product VARCHAR(13), PRIMARY KEY (id)"`.
    /// Exactly one statement runs; trailing SQL after the definition is an error.
    pub fn create_table(&self, table: &str, column_spec: &str) -> Result<()> {
        let sql = sql::create_table_sql(table, column_spec)?;
        self.db.execute(&sql, &[])?;
        info!(table, "table ensured");
        Ok(())
    }

    // ========================================
    // INSERT
    // ========================================

    /// Run a single `INSERT` (or `REPLACE`) statement.
    pub fn insert(&self, sql: &str) -> Result<QueryResult> {
        self.execute_kind(StatementKind::Insert, sql, &[])
    }

    /// Insert every row of `rows` into `columns` of `table` as one unit.
    ///
    /// Row `i`, value `j` is bound to placeholder `j + 1` of a single prepared
    /// `INSERT`. All rows commit together or none do; autocommit is restored
    /// whatever the outcome. Returns the number of rows written and the table
    /// contents afterwards.
    pub fn insert_batch(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<BatchResult> {
        if !self.db.supports_batch_updates() {
            debug!(table, "batch insert refused, batch updates disabled");
            return Err(OperationsError::BatchUnsupported);
        }

        let sql = sql::insert_sql(table, columns)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(OperationsError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        let tx = self.db.transaction(TransactionMode::Immediate)?;
        let mut changes = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                changes += stmt.run(row)?.changes;
            }
        }
        tx.commit()?;
        info!(table, rows = rows.len(), "batch committed");

        let table = self.select_all_columns(table)?;
        Ok(BatchResult { changes, table })
    }

    // ========================================
    // UPDATE
    // ========================================

    /// Run a single `UPDATE` statement.
    pub fn update(&self, sql: &str) -> Result<QueryResult> {
        self.execute_kind(StatementKind::Update, sql, &[])
    }

    /// Run an `UPDATE` whose placeholders are bound, in order, to `values`.
    pub fn update_prepared(&self, sql: &str, values: &[SqlValue]) -> Result<QueryResult> {
        self.execute_kind(StatementKind::Update, sql, values)
    }

    // ========================================
    // DELETE
    // ========================================

    /// Run a single `DELETE` statement.
    pub fn delete(&self, sql: &str) -> Result<QueryResult> {
        self.execute_kind(StatementKind::Delete, sql, &[])
    }

    /// Run a `DELETE` whose placeholders are bound, in order, to `values`.
    pub fn delete_prepared(&self, sql: &str, values: &[SqlValue]) -> Result<QueryResult> {
        self.execute_kind(StatementKind::Delete, sql, values)
    }

    // ========================================
    // SELECT
    // ========================================

    /// Run a read-only query; columns come back in the order the driver reports them.
    pub fn select(&self, sql: &str) -> Result<ResultSet> {
        self.select_prepared(sql, &[])
    }

    /// Run a read-only query with positional values.
    pub fn select_prepared(&self, sql: &str, values: &[SqlValue]) -> Result<ResultSet> {
        let kind = StatementKind::Select;
        kind.check(sql).inspect_err(|_| debug!(sql, "rejected, not a query"))?;

        let mut stmt = self.db.prepare(sql)?;
        if !stmt.readonly() {
            return Err(OperationsError::InvalidStatementKind {
                expected: kind,
                sql: sql.to_string(),
            });
        }
        stmt.all(values)
    }

    /// Select the named columns of `table`.
    pub fn select_columns(&self, table: &str, columns: &[&str]) -> Result<ResultSet> {
        let sql = sql::select_sql(table, Some(columns))?;
        self.db.query(&sql, &[])
    }

    /// Select every column of `table`.
    pub fn select_all_columns(&self, table: &str) -> Result<ResultSet> {
        let sql = sql::select_sql(table, None)?;
        self.db.query(&sql, &[])
    }

    // ========================================
    // CALLABLE
    // ========================================

    /// Evaluate a callable statement such as `{ ? = call surname(?) }`.
    ///
    /// `args` bind to the routine's placeholders in order; the output
    /// parameter is returned.
    pub fn call_function(&self, call_sql: &str, args: &[SqlValue]) -> Result<SqlValue> {
        self.db.call(call_sql, args)
    }

    /// Register a Rust function callable from SQL and from [`call_function`](Self::call_function).
    pub fn register_function<F>(&self, name: &str, n_args: i32, f: F) -> Result<()>
    where
        F: Fn(&[SqlValue]) -> std::result::Result<SqlValue, String>
            + Send
            + UnwindSafe
            + 'static,
    {
        self.db.create_function(name, n_args, f)
    }

    // ========================================
    // TRANSACTIONS
    // ========================================

    /// Open a transaction; it rolls back unless committed.
    pub fn transaction(&self, mode: TransactionMode) -> Result<Transaction<'_>> {
        self.db.transaction(mode)
    }

    fn execute_kind(
        &self,
        kind: StatementKind,
        sql: &str,
        values: &[SqlValue],
    ) -> Result<QueryResult> {
        kind.check(sql)
            .inspect_err(|_| debug!(sql, expected = %kind, "rejected statement"))?;
        let result = self.db.execute(sql, values)?;
        debug!(kind = %kind, changes = result.changes, "statement executed");
        Ok(result)
    }
}
