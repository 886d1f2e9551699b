//! FILENAME: app/dashboard/src/lib.rs
//! Dashboard host layer: declarative views loaded from JSON, one-call
//! evaluation over the filter and metric engines, and the unified logger.
//!
//! Layers:
//! - `config`: Serializable view definition (what a page IS)
//! - `evaluate`: Read path from records and active filters to a `ViewSnapshot`
//! - `logging`: `seq|LEVEL|category|message` logger behind the `log` facade

pub mod config;
pub mod error;
pub mod evaluate;
pub mod logging;

pub use config::{load_view, RankingSpec, SeriesSpec, ViewDefinition, DEFAULT_RANKING_LIMIT};
pub use error::DashboardError;
pub use evaluate::{Dashboard, RankingResult, SeriesResult, ViewSnapshot};
pub use logging::{init_logging, sort_log_file, LogConfig};
