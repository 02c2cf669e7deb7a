//! Database module - the single owned SQLite connection

use std::collections::HashMap;
use std::panic::UnwindSafe;
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use super::{SqlValue, Statement, Transaction, TransactionMode};
use crate::config::{ConnectionConfig, Target};
use crate::error::{OperationsError, Result};
use crate::models::{ColumnInfo, QueryResult, ResultSet};
use crate::sql::{callable_to_select, quote_identifier};

/// Database connection struct - one exclusively owned SQLite connection
///
/// The connection is `Send` but not `Sync`: a `Database` belongs to one owner
/// at a time and is never shared between threads without a lock.
pub struct Database {
    conn: Connection,
    config: ConnectionConfig,
    /// In-memory databases switched away from, by name
    parked: HashMap<String, Connection>,
}

impl Database {
    /// Open the database named by `config`, creating it if missing
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        let conn = Self::connect(config)?;
        info!(
            url = %config.url,
            database = %config.database,
            user = %config.user,
            "connected"
        );
        Ok(Database {
            conn,
            config: config.clone(),
            parked: HashMap::new(),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&ConnectionConfig::memory("main"))
    }

    fn connect(config: &ConnectionConfig) -> Result<Connection> {
        let target = config.target()?;
        let conn = match target {
            Target::Memory => Connection::open_in_memory()?,
            Target::File(ref path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = {};
             PRAGMA temp_store = MEMORY;",
            if config.foreign_keys { "ON" } else { "OFF" }
        ))?;

        if let Target::File(_) = target {
            // journal_mode answers with the mode it switched to
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            conn.execute_batch("PRAGMA synchronous = NORMAL")?;
            debug!(journal_mode = %mode, "file database configured");
        }

        Ok(conn)
    }

    /// Create the named database if it does not exist and switch to it.
    ///
    /// Naming the current database is a no-op. The new connection is opened
    /// before the current one is released, so a failure leaves this handle on
    /// the database it was using. In-memory databases stay alive after a
    /// switch and are picked up again when switched back to.
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        let config = self.config.for_database(name.trim());
        let target = config.target()?;
        if config.database == self.config.database {
            debug!(database = %config.database, "already current");
            return Ok(());
        }

        let conn = match self.parked.remove(&config.database) {
            Some(conn) => conn,
            None => Self::connect(&config)?,
        };
        let previous_conn = std::mem::replace(&mut self.conn, conn);
        let previous = std::mem::replace(&mut self.config, config);
        if target == Target::Memory {
            self.parked.insert(previous.database, previous_conn);
        }
        info!(database = %self.config.database, "switched database");
        Ok(())
    }

    pub fn current_database(&self) -> &str {
        &self.config.database
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn supports_batch_updates(&self) -> bool {
        self.config.batch_updates
    }

    pub fn is_autocommit(&self) -> bool {
        self.conn.is_autocommit()
    }

    /// Prepare a SQL statement for execution
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        Statement::new(&self.conn, sql)
    }

    /// Execute one statement with positional values
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        self.prepare(sql)?.run(params)
    }

    /// Run a query and collect every row
    pub fn query(&self, sql: &str, params: &[SqlValue]) -> Result<ResultSet> {
        self.prepare(sql)?.all(params)
    }

    /// Begin a transaction
    pub fn transaction(&self, mode: TransactionMode) -> Result<Transaction<'_>> {
        Transaction::begin(&self.conn, mode)
    }

    /// Register a scalar SQL function implemented in Rust.
    ///
    /// `n_args` is the exact argument count, or -1 for any. The function is
    /// evaluated on every call; SQLite never folds or reuses its results.
    pub fn create_function<F>(&self, name: &str, n_args: i32, f: F) -> Result<()>
    where
        F: Fn(&[SqlValue]) -> std::result::Result<SqlValue, String>
            + Send
            + UnwindSafe
            + 'static,
    {
        self.conn.create_scalar_function(
            name,
            n_args,
            FunctionFlags::SQLITE_UTF8,
            move |ctx| {
                let args: Vec<SqlValue> = (0..ctx.len())
                    .map(|i| SqlValue::from_value_ref(ctx.get_raw(i)))
                    .collect();
                f(&args).map_err(|msg| rusqlite::Error::UserFunctionError(msg.into()))
            },
        )?;
        debug!(name, n_args, "registered function");
        Ok(())
    }

    /// Evaluate a callable statement (`{ ? = call name(?) }`) and return its output value
    pub fn call(&self, call_sql: &str, args: &[SqlValue]) -> Result<SqlValue> {
        let select = callable_to_select(call_sql)?;
        let row = self.prepare(&select)?.get(args)?;
        row.and_then(|values| values.into_iter().next())
            .ok_or_else(|| OperationsError::InvalidCall(call_sql.to_string()))
    }

    // ========================================
    // Schema Introspection Methods
    // ========================================

    /// Get list of all tables in the database
    pub fn get_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;

        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(tables)
    }

    /// Check if a table exists
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table_name],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Get column information for a table
    pub fn get_columns(&self, table_name: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(table_name)?))?;

        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    cid: row.get(0)?,
                    name: row.get(1)?,
                    col_type: row.get(2)?,
                    notnull: row.get::<_, i64>(3)? == 1,
                    dflt_value: row.get(4)?,
                    pk: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(columns)
    }

    /// Number of rows in a table
    pub fn row_count(&self, table_name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name)?);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("parked", &self.parked.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.is_autocommit());
        assert!(db.supports_batch_updates());
        assert_eq!(db.get_tables().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_introspection() {
        let db = Database::open_in_memory().unwrap();
        db.execute(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT NOT NULL DEFAULT 'x')",
            &[],
        )
        .unwrap();
        assert!(db.table_exists("items").unwrap());
        assert!(!db.table_exists("missing").unwrap());

        let columns = db.get_columns("items").unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].pk, 1);
        assert_eq!(columns[1].col_type, "TEXT");
        assert!(columns[1].notnull);
        assert_eq!(columns[1].dflt_value.as_deref(), Some("'x'"));
        assert_eq!(db.row_count("items").unwrap(), 0);
    }

    #[test]
    fn test_call_registered_function() {
        let db = Database::open_in_memory().unwrap();
        db.create_function("twice", 1, |args| match args {
            [SqlValue::Integer(i)] => Ok(SqlValue::Integer(i * 2)),
            _ => Err("twice expects one integer".to_string()),
        })
        .unwrap();

        let value = db
            .call("{ ? = call twice(?) }", &[SqlValue::Integer(21)])
            .unwrap();
        assert_eq!(value, SqlValue::Integer(42));

        let err = db.call("{ ? = call twice(?) }", &[SqlValue::from("x")]);
        assert!(matches!(err, Err(OperationsError::Database(_))));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE trucks (id TEXT PRIMARY KEY)", &[])
            .unwrap();
        db.execute(
            "CREATE TABLE drivers (dni TEXT PRIMARY KEY, truck TEXT REFERENCES trucks(id))",
            &[],
        )
        .unwrap();
        let result = db.execute(
            "INSERT INTO drivers (dni, truck) VALUES (?1, ?2)",
            &["1".into(), "missing".into()],
        );
        assert!(matches!(result, Err(OperationsError::Database(_))));
    }
}
