//! Scalar values and per-cell type detection.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Cheap pre-filter before trying the chrono formats.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap(), // ISO date
        Regex::new(r"^\d{2}/\d{2}/\d{4}").unwrap(), // US date
        Regex::new(r"^\d{4}/\d{2}/\d{2}").unwrap(), // Alt ISO
    ]
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Inferred primitive type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Free text. Also used for columns with no non-null values.
    Text,
    /// Date and/or time values.
    Timestamp,
    /// Boolean values (true/false).
    Boolean,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Type of a column built by stacking a column of `self` with one of `other`.
    ///
    /// Integer and Float widen to Float; any other mismatch keeps `self`.
    pub fn unify(self, other: ColumnType) -> ColumnType {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer) => {
                ColumnType::Float
            }
            (a, _) => a,
        }
    }

    /// Infer the narrowest type that fits every non-null cell.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
        let mut seen: Option<ColumnType> = None;

        for cell in cells {
            if is_null_token(cell) {
                continue;
            }
            let detected = detect_cell_type(cell.trim());
            seen = Some(match seen {
                None => detected,
                Some(current) if current == detected => current,
                Some(current) if current.is_numeric() && detected.is_numeric() => ColumnType::Float,
                Some(_) => return ColumnType::Text,
            });
        }

        seen.unwrap_or(ColumnType::Text)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Parse a raw cell as the given column type. Unparseable cells become null.
    pub fn parse(raw: &str, column_type: ColumnType) -> Value {
        if is_null_token(raw) {
            return Value::Null;
        }
        let trimmed = raw.trim();
        match column_type {
            ColumnType::Integer => trimmed.parse().map(Value::Integer).unwrap_or(Value::Null),
            ColumnType::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Null),
            ColumnType::Boolean => parse_bool(trimmed).map(Value::Boolean).unwrap_or(Value::Null),
            ColumnType::Timestamp => parse_timestamp(trimmed)
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            ColumnType::Text => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to another column type. Values that do not fit become null.
    pub fn coerce(self, target: ColumnType) -> Value {
        match (self, target) {
            (Value::Null, _) => Value::Null,
            (v @ Value::Integer(_), ColumnType::Integer) => v,
            (v @ Value::Float(_), ColumnType::Float) => v,
            (v @ Value::Boolean(_), ColumnType::Boolean) => v,
            (v @ Value::Timestamp(_), ColumnType::Timestamp) => v,
            (v @ Value::Text(_), ColumnType::Text) => v,
            (Value::Integer(i), ColumnType::Float) => Value::Float(i as f64),
            (Value::Float(f), ColumnType::Integer) if f.fract() == 0.0 => Value::Integer(f as i64),
            (Value::Text(s), target) => Value::parse(&s, target),
            (other, ColumnType::Text) => Value::Text(other.to_string()),
            _ => Value::Null,
        }
    }

    /// Total order used for deterministic sorting. Nulls sort last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }

    /// Key identifying equal values within one column.
    pub(crate) fn distinct_key(&self) -> String {
        match self {
            Value::Float(f) => format!("f{}", f.to_bits()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Timestamp(v) => {
                if v.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", v.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// Check if a raw cell represents a missing value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("#n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Detect the type of a single non-null cell.
fn detect_cell_type(value: &str) -> ColumnType {
    if parse_bool(value).is_some() {
        return ColumnType::Boolean;
    }
    if value.parse::<i64>().is_ok() {
        return ColumnType::Integer;
    }
    if value.parse::<f64>().is_ok() {
        return ColumnType::Float;
    }
    if parse_timestamp(value).is_some() {
        return ColumnType::Timestamp;
    }
    ColumnType::Text
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse common date and datetime spellings, including RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if !DATE_PATTERNS.iter().any(|p| p.is_match(value)) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_token() {
        assert!(is_null_token(""));
        assert!(is_null_token("NA"));
        assert!(is_null_token("n/a"));
        assert!(is_null_token("NaN"));
        assert!(is_null_token("null"));
        assert!(is_null_token("-"));
        assert!(!is_null_token("0"));
        assert!(!is_null_token("value"));
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(ColumnType::infer(["1", "2", "300"]), ColumnType::Integer);
        assert_eq!(ColumnType::infer(["1", "2.5", ""]), ColumnType::Float);
        assert_eq!(ColumnType::infer(["true", "FALSE"]), ColumnType::Boolean);
        assert_eq!(
            ColumnType::infer(["2024-01-15", "2023-11-15T14:00:00Z"]),
            ColumnType::Timestamp
        );
        assert_eq!(ColumnType::infer(["1", "abc"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["", "NA"]), ColumnType::Text);
    }

    #[test]
    fn test_unify() {
        assert_eq!(ColumnType::Integer.unify(ColumnType::Float), ColumnType::Float);
        assert_eq!(ColumnType::Text.unify(ColumnType::Integer), ColumnType::Text);
        assert_eq!(ColumnType::Integer.unify(ColumnType::Text), ColumnType::Integer);
    }

    #[test]
    fn test_coerce_mismatch_becomes_null() {
        assert_eq!(Value::Text("abc".into()).coerce(ColumnType::Integer), Value::Null);
        assert_eq!(Value::Text("42".into()).coerce(ColumnType::Integer), Value::Integer(42));
        assert_eq!(Value::Integer(3).coerce(ColumnType::Float), Value::Float(3.0));
        assert_eq!(Value::Boolean(true).coerce(ColumnType::Text), Value::Text("true".into()));
    }

    #[test]
    fn test_sort_cmp_nulls_last() {
        let mut values = vec![Value::Null, Value::Integer(3), Value::Float(1.5)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Value::Float(1.5), Value::Integer(3), Value::Null]);
    }

    #[test]
    fn test_timestamp_display() {
        let v = Value::parse("2024-03-01", ColumnType::Timestamp);
        assert_eq!(v.to_string(), "2024-03-01");
        let v = Value::parse("2023-11-15T14:00:00Z", ColumnType::Timestamp);
        assert_eq!(v.to_string(), "2023-11-15 14:00:00");
    }
}
