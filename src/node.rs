//! Node.js binding of the helper (feature `node`)

use std::sync::{Mutex, MutexGuard};

use napi::{Error, Result};
use napi_derive::napi;

use crate::db::{convert_params, convert_rows};
use crate::error::to_napi_error;
use crate::{Operations, QueryResult};

#[napi(object)]
pub struct JsQueryResult {
    pub changes: u32,
    pub last_insert_rowid: i64,
}

impl TryFrom<QueryResult> for JsQueryResult {
    type Error = Error;

    fn try_from(result: QueryResult) -> Result<Self> {
        let changes = u32::try_from(result.changes).map_err(|_| {
            Error::from_reason(format!("row count {} exceeds u32", result.changes))
        })?;
        Ok(JsQueryResult {
            changes,
            last_insert_rowid: result.last_insert_rowid,
        })
    }
}

#[napi]
pub fn get_sqlite_version() -> String {
    crate::get_sqlite_version()
}

/// `Operations` class exported to JavaScript
#[napi(js_name = "Operations")]
pub struct JsOperations {
    inner: Mutex<Operations>,
}

impl JsOperations {
    fn lock(&self) -> Result<MutexGuard<'_, Operations>> {
        self.inner
            .lock()
            .map_err(|_| Error::from_reason("DB Lock failed"))
    }
}

#[napi]
impl JsOperations {
    #[napi(constructor)]
    pub fn new(url: String, database: String, user: String, password: String) -> Result<Self> {
        let ops = Operations::connect(&url, &database, &user, &password).map_err(to_napi_error)?;
        Ok(JsOperations {
            inner: Mutex::new(ops),
        })
    }

    #[napi]
    pub fn create_database(&self, name: String) -> Result<()> {
        self.lock()?.create_database(&name).map_err(to_napi_error)
    }

    #[napi]
    pub fn create_table(&self, table: String, column_spec: String) -> Result<()> {
        self.lock()?
            .create_table(&table, &column_spec)
            .map_err(to_napi_error)
    }

    #[napi]
    pub fn insert(&self, sql: String) -> Result<JsQueryResult> {
        let result = self.lock()?.insert(&sql).map_err(to_napi_error)?;
        result.try_into()
    }

    /// Insert rows (arrays of values) and return the table afterwards
    #[napi]
    pub fn insert_batch(
        &self,
        table: String,
        columns: Vec<String>,
        rows: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let rows = convert_rows(&rows);
        let batch = self
            .lock()?
            .insert_batch(&table, &columns, &rows)
            .map_err(to_napi_error)?;
        Ok(batch.table.to_json())
    }

    #[napi]
    pub fn update(&self, sql: String) -> Result<JsQueryResult> {
        let result = self.lock()?.update(&sql).map_err(to_napi_error)?;
        result.try_into()
    }

    #[napi]
    pub fn update_prepared(
        &self,
        sql: String,
        values: Vec<serde_json::Value>,
    ) -> Result<JsQueryResult> {
        let result = self
            .lock()?
            .update_prepared(&sql, &convert_params(&values))
            .map_err(to_napi_error)?;
        result.try_into()
    }

    #[napi]
    pub fn delete(&self, sql: String) -> Result<JsQueryResult> {
        let result = self.lock()?.delete(&sql).map_err(to_napi_error)?;
        result.try_into()
    }

    #[napi]
    pub fn delete_prepared(
        &self,
        sql: String,
        values: Vec<serde_json::Value>,
    ) -> Result<JsQueryResult> {
        let result = self
            .lock()?
            .delete_prepared(&sql, &convert_params(&values))
            .map_err(to_napi_error)?;
        result.try_into()
    }

    /// Execute query and return all rows as objects
    #[napi]
    pub fn select(&self, sql: String) -> Result<serde_json::Value> {
        let rows = self.lock()?.select(&sql).map_err(to_napi_error)?;
        Ok(rows.to_json())
    }

    #[napi]
    pub fn select_columns(&self, table: String, columns: Vec<String>) -> Result<serde_json::Value> {
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let rows = self
            .lock()?
            .select_columns(&table, &columns)
            .map_err(to_napi_error)?;
        Ok(rows.to_json())
    }

    #[napi]
    pub fn select_all_columns(&self, table: String) -> Result<serde_json::Value> {
        let rows = self
            .lock()?
            .select_all_columns(&table)
            .map_err(to_napi_error)?;
        Ok(rows.to_json())
    }

    #[napi]
    pub fn call_function(
        &self,
        call_sql: String,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let value = self
            .lock()?
            .call_function(&call_sql, &convert_params(&args))
            .map_err(to_napi_error)?;
        Ok(value.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_fit_u32() {
        let result = QueryResult {
            changes: 3,
            last_insert_rowid: 7,
        };
        let js = JsQueryResult::try_from(result).unwrap();
        assert_eq!(js.changes, 3);
        assert_eq!(js.last_insert_rowid, 7);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_changes_are_an_error() {
        let result = QueryResult {
            changes: usize::MAX,
            last_insert_rowid: 0,
        };
        assert!(JsQueryResult::try_from(result).is_err());
    }
}
