//! FILENAME: core/records/src/lib.rs
//! Record model shared by the dashboard engines.
//!
//! Layers:
//! - `value`: The value of one field (text, number, date, flag, nested object)
//! - `record`: One data row
//! - `path`: Dotted field paths and the total value extractor
//! - `date`: Date parsing and calendar-day helpers
//! - `diagnostics`: Explicit sink for configuration warnings

pub mod date;
pub mod diagnostics;
pub mod error;
pub mod path;
pub mod record;
pub mod value;

pub use date::{day_key, end_of_day, is_set_date, parse_date, parse_date_str, start_of_day};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, LogSink, Severity};
pub use error::RecordError;
pub use path::{extract, extract_delimited, split_tokens, FieldPath};
pub use record::Record;
pub use value::{Value, UNKNOWN_SENTINEL};
