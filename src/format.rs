//! Plain-text rendering of results for console display.

use std::fmt;

use crate::models::{QueryResult, ResultSet};
use crate::sql::StatementKind;

/// Header line of column names, then one line per row.
///
/// Values are separated by single spaces; NULL renders as `null`.
pub fn render_table(result: &ResultSet) -> String {
    let mut out = result.columns.join(" ");
    out.push('\n');
    for row in &result.rows {
        let line = row
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// One-line summary of a mutation, e.g. `Rows inserted: 2`.
pub fn render_changes(kind: StatementKind, result: &QueryResult) -> String {
    format!("Rows {}: {}", kind.past_tense(), result.changes)
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_table(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlValue;

    #[test]
    fn test_render_table() {
        let result = ResultSet {
            columns: vec!["id".to_string(), "product".to_string()],
            rows: vec![
                vec![SqlValue::from("1"), SqlValue::from("generic")],
                vec![SqlValue::from("2"), SqlValue::Null],
            ],
        };
        assert_eq!(render_table(&result), "id product\n1 generic\n2 null\n");
        assert_eq!(result.to_string(), render_table(&result));
    }

    #[test]
    fn test_render_empty_table_keeps_header() {
        let result = ResultSet {
            columns: vec!["id".to_string()],
            rows: vec![],
        };
        assert_eq!(render_table(&result), "id\n");
    }

    #[test]
    fn test_render_changes() {
        let result = QueryResult {
            changes: 2,
            last_insert_rowid: 2,
        };
        assert_eq!(render_changes(StatementKind::Insert, &result), "Rows inserted: 2");
        assert_eq!(render_changes(StatementKind::Delete, &result), "Rows deleted: 2");
    }
}
