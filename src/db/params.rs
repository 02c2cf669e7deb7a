//! Params module - utilities for converting JSON parameters to SQL values

use serde_json::Value;

use super::SqlValue;

/// Convert JSON parameters to positional SQL values
///
/// # Arguments
/// * `params` - Slice of JSON values representing the parameters
///
/// # Returns
/// One bindable value per parameter, in order
pub fn convert_params(params: &[Value]) -> Vec<SqlValue> {
    params.iter().map(convert_single_param).collect()
}

/// Convert a batch of JSON rows (arrays) to value rows.
///
/// A row that is not a JSON array is treated as a single-column row.
pub fn convert_rows(rows: &[Value]) -> Vec<Vec<SqlValue>> {
    rows.iter()
        .map(|row| match row {
            Value::Array(values) => convert_params(values),
            other => vec![convert_single_param(other)],
        })
        .collect()
}

/// Convert a single JSON value to a SQL value
///
/// Booleans become 0/1, arrays and objects are stored as their JSON text.
pub fn convert_single_param(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_params() {
        let values = convert_params(&[json!(null), json!(true), json!(3), json!(1.5), json!("x")]);
        assert_eq!(
            values,
            vec![
                SqlValue::Null,
                SqlValue::Integer(1),
                SqlValue::Integer(3),
                SqlValue::Real(1.5),
                SqlValue::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_values_become_json_text() {
        assert_eq!(
            convert_single_param(&json!({"a": [1, 2]})),
            SqlValue::Text(r#"{"a":[1,2]}"#.to_string())
        );
    }

    #[test]
    fn test_convert_rows() {
        let rows = convert_rows(&[json!(["1", "generic"]), json!("solo")]);
        assert_eq!(rows[0], vec![SqlValue::from("1"), SqlValue::from("generic")]);
        assert_eq!(rows[1], vec![SqlValue::from("solo")]);
    }
}
