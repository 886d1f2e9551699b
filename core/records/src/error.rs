//! FILENAME: core/records/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid field path: {0:?}")]
    InvalidPath(String),
}
