use serde::{Deserialize, Serialize};

use crate::db::SqlValue;

/// Outcome of a mutating statement.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    pub changes: usize,
    pub last_insert_rowid: i64,
}

/// Rows of a query, with the column names in driver order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name (first match, case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `row` for the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&SqlValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Every row rendered to text, in order; handy for assertions.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }

    /// JSON array with one object per row, keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (name, value) in self.columns.iter().zip(row) {
                    map.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// Outcome of a batched insert: rows written plus the table as it is afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub changes: usize,
    pub table: ResultSet,
}

/// One column of a table, as reported by `PRAGMA table_info`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
    pub notnull: bool,
    pub dflt_value: Option<String>,
    pub pk: i64,
}
