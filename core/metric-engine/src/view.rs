//! FILENAME: core/metric-engine/src/view.rs
//! PURPOSE: Output contracts consumed by KPI cards, rank charts and series charts.
//! CONTEXT: Everything here is recomputed per evaluation and never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::definition::{MetricDisplay, MetricSpec, MetricValue};

/// One scalar metric with its display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiValue {
    pub id: String,
    pub value: MetricValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    pub display: MetricDisplay,
}

impl KpiValue {
    pub fn new(metric: &MetricSpec, value: MetricValue) -> Self {
        KpiValue {
            id: metric.id.clone(),
            value,
            decimals: metric.decimals,
            display: metric.display.clone(),
        }
    }
}

/// One group of a ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    /// Dimension value (or token) the group was formed on.
    pub key: String,
    pub display_label: String,
    pub aggregated_value: MetricValue,
    /// Rows in the group after expansion and metric conditions.
    pub member_count: usize,
}

/// One time bucket of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// First day of the period.
    pub bucket: NaiveDate,
    pub label: String,
    pub value: MetricValue,
    pub member_count: usize,
}
