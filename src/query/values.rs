//! Literal typing and comparison of query-string values against record values.

use crate::config::ColumnInfo;
use serde_json::Value;
use std::cmp::Ordering;

/// Type a query-string literal by the column's PostgreSQL type. Unknown types stay text.
pub fn typed_value(column: Option<&ColumnInfo>, s: &str) -> Value {
    let pg_type = column
        .and_then(|c| c.pg_type.as_deref())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let is_int = pg_type.contains("int") || pg_type.contains("serial");
    let is_float = pg_type.starts_with("float") || pg_type == "real" || pg_type.starts_with("double");
    let is_bool = pg_type.starts_with("bool");
    let is_uuid = pg_type == "uuid";

    if is_int {
        if let Ok(n) = s.parse::<i64>() {
            return Value::Number(n.into());
        }
    }
    if is_float {
        if let Some(n) = s.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    if is_bool {
        if s.eq_ignore_ascii_case("true") || s == "1" {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") || s == "0" {
            return Value::Bool(false);
        }
    }
    if is_uuid {
        if let Ok(u) = uuid::Uuid::parse_str(s) {
            return Value::String(u.to_string());
        }
    }
    Value::String(s.to_string())
}

/// Text form used to match record values against request literals (`3` matches `"3"`).
pub fn canonical_key(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(true) => "1".into(),
        Value::Bool(false) => "0".into(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Natural ascending order: nulls first, numbers numerically, strings lexically.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
