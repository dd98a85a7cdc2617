//! Typed reads from schemaless pipe rows.
//!
//! The analytics service is loose about types: quantities may come back as
//! numbers or numeric strings, and dates in several layouts.

use crate::models::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// String field; empty strings count as missing.
pub fn text<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numeric field, accepting JSON numbers and numeric strings.
pub fn number(row: &Row, key: &str) -> Option<f64> {
    match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First of `keys` that holds a number.
pub fn number_any(row: &Row, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| number(row, key))
}

/// Timestamp field. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and bare dates,
/// all read as UTC.
pub fn timestamp(row: &Row, key: &str) -> Option<DateTime<Utc>> {
    text(row, key).and_then(parse_timestamp)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Case-insensitive match of a string field against any of `values`.
pub fn is_one_of(row: &Row, key: &str, values: &[&str]) -> bool {
    text(row, key).is_some_and(|s| values.iter().any(|v| s.eq_ignore_ascii_case(v)))
}

/// `part / whole` as a percentage, zero when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
