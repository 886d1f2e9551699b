//! FILENAME: app/dashboard/src/error.rs

use std::path::PathBuf;

use filter_engine::FilterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to read view file {path:?}: {source}")]
    ReadView {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid view definition: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Duplicate metric id: {0}")]
    DuplicateMetric(String),

    #[error("{context} references unknown metric: {metric}")]
    UnknownMetric { context: String, metric: String },

    #[error("Log file error: {0}")]
    Log(#[from] std::io::Error),
}
