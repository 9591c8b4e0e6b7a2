//! Value coercion helpers shared by the rule and sanitizer catalogs.
//!
//! JSON values arriving from clients are loosely typed: numbers show up as
//! strings, booleans as `"1"`, and so on. Rules and sanitizers therefore
//! coerce scalars before inspecting them instead of failing on the exact
//! `Value` variant.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Coerce a scalar value to a string. Arrays, objects and null return
/// `None`.
pub(crate) fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce a value to a float: numbers directly, strings when their trimmed
/// content parses as a number.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// True when a value is absent for validation purposes: null, or a string
/// that is empty after trimming.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Loose truthiness, matching how rule parameters are written in config:
/// `false`, `null`, `0`, `""`, `[]` and `{}` are all "off".
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Loose equality: identical values, or scalars whose string or numeric
/// coercions match (`5 == "5"`).
pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x == y;
    }
    match (as_string(a), as_string(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Leading-numeric-prefix integer coercion: `"7abc"` is 7, `"abc"` is 0,
/// `"-12.9"` is -12. Booleans map to 1/0 and numbers truncate.
pub(crate) fn int_prefix(value: &Value) -> i64 {
    match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            let mut end = 0;
            for (i, c) in s.char_indices() {
                if i == 0 && (c == '-' || c == '+') {
                    end = i + c.len_utf8();
                } else if c.is_ascii_digit() {
                    end = i + c.len_utf8();
                } else {
                    break;
                }
            }
            s[..end].parse::<i64>().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Parse a date or date-time string in the formats accepted across the
/// rule and sanitizer catalogs.
pub(crate) fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y", "%d %B %Y", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
