//! SQL text utilities: statement kinds, identifier quoting and the statement
//! builders used by the operations helper.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{OperationsError, Result};

/// First keyword of a statement, skipping whitespace and comments
static LEADING_KEYWORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?:\s+|--[^\n]*(?:\n|$)|/\*.*?\*/)*([A-Za-z]+)").unwrap()
});

/// Callable statement in escape syntax: `{ ? = call name(?, ?) }` or `{ call name }`
static CALL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^\s*\{\s*(?:\?\s*=\s*)?call\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*\}\s*;?\s*$",
    )
    .unwrap()
});

/// Kind of statement an operation is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    CreateTable,
    Insert,
    Update,
    Delete,
    Select,
}

impl StatementKind {
    /// Leading keywords accepted for this kind
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            StatementKind::CreateTable => &["CREATE"],
            StatementKind::Insert => &["INSERT", "REPLACE"],
            StatementKind::Update => &["UPDATE"],
            StatementKind::Delete => &["DELETE"],
            StatementKind::Select => &["SELECT", "WITH", "VALUES"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Select => "SELECT",
        }
    }

    /// Verb used when reporting affected rows ("Rows inserted: 2").
    pub fn past_tense(self) -> &'static str {
        match self {
            StatementKind::CreateTable => "created",
            StatementKind::Insert => "inserted",
            StatementKind::Update => "updated",
            StatementKind::Delete => "deleted",
            StatementKind::Select => "selected",
        }
    }

    /// Whether the leading keyword of `sql` belongs to this kind (case-insensitive).
    pub fn matches(self, sql: &str) -> bool {
        match leading_keyword(sql) {
            Some(keyword) => self.keywords().contains(&keyword.as_str()),
            None => false,
        }
    }

    /// Reject `sql` unless it is a statement of this kind.
    pub fn check(self, sql: &str) -> Result<()> {
        if self.matches(sql) {
            Ok(())
        } else {
            Err(OperationsError::InvalidStatementKind {
                expected: self,
                sql: sql.to_string(),
            })
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-cased first keyword of a statement, if any.
pub fn leading_keyword(sql: &str) -> Option<String> {
    LEADING_KEYWORD_REGEX
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Trim a table, column or database name and reject unusable ones.
pub fn validate_identifier(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains('\0') {
        return Err(OperationsError::InvalidIdentifier(name.to_string()));
    }
    Ok(trimmed)
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> Result<String> {
    let name = validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Comma-separated list of quoted column names.
pub fn column_list(columns: &[&str]) -> Result<String> {
    if columns.is_empty() {
        return Err(OperationsError::EmptyColumns);
    }
    let quoted = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

/// Numbered positional placeholders: `?1, ?2, ..., ?n`.
pub fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn create_table_sql(table: &str, column_spec: &str) -> Result<String> {
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table)?,
        column_spec
    ))
}

pub fn insert_sql(table: &str, columns: &[&str]) -> Result<String> {
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table)?,
        column_list(columns)?,
        placeholders(columns.len())
    ))
}

/// `SELECT <columns> FROM <table>`, or `SELECT *` when no columns are given.
pub fn select_sql(table: &str, columns: Option<&[&str]>) -> Result<String> {
    let projection = match columns {
        Some(columns) => column_list(columns)?,
        None => "*".to_string(),
    };
    Ok(format!(
        "SELECT {} FROM {}",
        projection,
        quote_identifier(table)?
    ))
}

/// Translate a callable statement into the `SELECT` that evaluates it.
///
/// `{ ? = call surname(?) }` becomes `SELECT surname(?)`; the output parameter
/// is the single column of the single result row.
pub fn callable_to_select(call_sql: &str) -> Result<String> {
    let caps = CALL_REGEX
        .captures(call_sql)
        .ok_or_else(|| OperationsError::InvalidCall(call_sql.to_string()))?;
    let name = &caps[1];
    let args = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    Ok(format!("SELECT {}({})", name, args))
}
