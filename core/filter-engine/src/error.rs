//! FILENAME: core/filter-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Duplicate filter key: {0}")]
    DuplicateKey(String),

    #[error("Unknown comparison operator: {0:?}")]
    UnknownOperator(String),
}
