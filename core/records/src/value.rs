//! FILENAME: core/records/src/value.rs
//! PURPOSE: Defines the value held by a single record field.
//! CONTEXT: Dashboard rows arrive as loosely typed JSON objects. `Value` keeps
//! the handful of shapes the views need (text, numbers, dates, flags, one level
//! of nesting) and owns the coercions shared by the filter and metric engines.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Placeholder the data exports use for "no value". Never offered as a filter
/// option and never used as a grouping key.
pub const UNKNOWN_SENTINEL: &str = "Unknown";

/// The value of one field in a record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    /// Shallow nesting, reached through dotted field paths.
    Object(Record),
}

impl Value {
    /// Numeric coercion. Numbers pass through, text is trimmed and parsed.
    /// Everything else (and NaN) is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Record> {
        match self {
            Value::Object(r) => Some(r),
            _ => None,
        }
    }

    /// Null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// True for the `"Unknown"` placeholder.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Text(s) if s.trim() == UNKNOWN_SENTINEL)
    }

    /// Blank or the unknown placeholder: neither can be selected or grouped on.
    pub fn is_missing(&self) -> bool {
        self.is_blank() || self.is_unknown()
    }

    /// Returns the value as a String, the form used for option lists,
    /// grouping keys and text search.
    pub fn display_value(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Date(dt) => {
                if dt.time() == NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            }
            Value::Object(_) => String::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value.and_time(NaiveTime::MIN))
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
