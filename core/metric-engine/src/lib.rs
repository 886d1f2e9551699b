//! FILENAME: core/metric-engine/src/lib.rs
//! Metric subsystem for the dashboards.
//!
//! Reduces filtered record collections to KPI scalars, ranked groups and time
//! series. It depends on `records` for the row model and on `filter-engine`
//! for the comparison operators used by metric conditions.
//!
//! Layers:
//! - `definition`: Serializable configuration (what a metric IS)
//! - `accumulator`: Incremental reduction state (HOW we compute)
//! - `aggregate`: Scalar KPIs
//! - `grouped`: Ranked groups with delimiter expansion
//! - `series`: Time-bucketed groups
//! - `view`: Renderable output (WHAT we display)

pub mod accumulator;
pub mod aggregate;
pub mod definition;
pub mod grouped;
pub mod series;
pub mod view;

pub use accumulator::MetricAccumulator;
pub use aggregate::{aggregate, aggregate_rows, round_to};
pub use definition::*;
pub use grouped::{group_metric, top_n, LABEL_SEPARATOR};
pub use series::{bucket_label, bucket_start, time_series, SeriesOptions};
pub use view::{GroupResult, KpiValue, SeriesPoint};
