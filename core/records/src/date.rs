//! FILENAME: core/records/src/date.rs
//! PURPOSE: Date parsing and calendar-day helpers.
//! CONTEXT: Exports carry dates as ISO strings, US-style strings, RFC 3339
//! timestamps or epoch milliseconds. All of them are reduced to a naive local
//! date-time; the dashboards never convert between zones.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::value::Value;

/// Dates in or before this year are export defaults ("unset"), not real data.
pub const EPOCH_SENTINEL_YEAR: i32 = 1970;

/// Dates in or before this year never count towards a date boundary.
pub const MIN_BOUNDARY_YEAR: i32 = 1900;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a field value as a date-time. Returns `None` for anything that is
/// not recognisably a date.
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(dt) => Some(*dt),
        Value::Text(s) => parse_date_str(s),
        Value::Number(ms) => from_epoch_millis(*ms),
        _ => None,
    }
}

pub fn parse_date_str(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(start_of_day(date));
        }
    }
    None
}

fn from_epoch_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
}

/// Local midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 on `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::milliseconds(86_399_999)
}

/// Calendar-day ISO key (`YYYY-MM-DD`) used to compare dates by day.
pub fn day_key(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// False for the epoch-default placeholder dates.
pub fn is_set_date(dt: &NaiveDateTime) -> bool {
    dt.year() > EPOCH_SENTINEL_YEAR
}
