//! FILENAME: core/records/src/path.rs
//! PURPOSE: Field paths and the value extractor.
//! CONTEXT: Views address fields by name, optionally dotted into nested objects
//! (`"meta.rating"`). Extraction is total: a missing segment yields `None`,
//! never a panic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::RecordError;
use crate::record::Record;
use crate::value::{Value, UNKNOWN_SENTINEL};

/// A parsed, non-empty field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    /// The path as written, also tried as a flat column name.
    raw: String,
    segments: SmallVec<[String; 2]>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, RecordError> {
        let raw = path.trim();
        if raw.is_empty() {
            return Err(RecordError::InvalidPath(path.to_string()));
        }

        let mut segments = SmallVec::new();
        for segment in raw.split('.') {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(RecordError::InvalidPath(path.to_string()));
            }
            segments.push(segment.to_string());
        }

        Ok(FieldPath {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FieldPath {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Resolves `path` on `record`.
///
/// A flat column whose name is the full dotted string wins over nested lookup,
/// so CSV headers such as `"rating.imdb"` keep working.
pub fn extract<'a>(record: &'a Record, path: &FieldPath) -> Option<&'a Value> {
    if let Some(value) = record.get(path.as_str()) {
        return Some(value);
    }
    if !path.is_nested() {
        return None;
    }

    let (first, rest) = path.segments().split_first()?;
    let mut current = record.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Splits the text value at `path` into trimmed tokens, dropping empty tokens
/// and the `"Unknown"` placeholder. Absent or non-text fields give no tokens.
pub fn extract_delimited(record: &Record, path: &FieldPath, delimiter: &str) -> Vec<String> {
    match extract(record, path) {
        Some(Value::Text(text)) => split_tokens(text, delimiter)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Token iterator shared by delimited matching and delimiter expansion.
pub fn split_tokens<'a>(text: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let pieces: Box<dyn Iterator<Item = &'a str>> = if delimiter.is_empty() {
        Box::new(std::iter::once(text))
    } else {
        Box::new(text.split(delimiter))
    };
    pieces
        .map(str::trim)
        .filter(|token| !token.is_empty() && *token != UNKNOWN_SENTINEL)
}
