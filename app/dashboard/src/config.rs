//! FILENAME: app/dashboard/src/config.rs
//! PURPOSE: Declarative view configuration (what a dashboard page IS).
//! CONTEXT: A view is authored as JSON: its filter controls, KPI metrics,
//! ranked lists and time series. Metrics are declared once and referenced by id.

use std::path::Path;

use filter_engine::{FilterSpec, FilterSpecs};
use metric_engine::{DatePeriod, DimensionSpec, MetricSpec, SortDirection};
use records::FieldPath;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::{log_enter_info, log_exit_info};

pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// A ranked list: `metric` grouped by `dimension`, top `limit` kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingSpec {
    pub id: String,
    pub dimension: DimensionSpec,
    /// Id of a metric in the view's `metrics`.
    pub metric: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub direction: SortDirection,
}

fn default_limit() -> usize {
    DEFAULT_RANKING_LIMIT
}

/// A chart of `metric` bucketed by `date_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub id: String,
    pub date_field: FieldPath,
    #[serde(default)]
    pub period: DatePeriod,
    pub metric: String,
    #[serde(default)]
    pub fill_gaps: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    pub name: String,

    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    /// Every metric is shown as a KPI card.
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,

    #[serde(default)]
    pub rankings: Vec<RankingSpec>,

    #[serde(default)]
    pub series: Vec<SeriesSpec>,
}

impl ViewDefinition {
    /// Parses and validates a view.
    pub fn from_json_str(json: &str) -> Result<Self, DashboardError> {
        let view: ViewDefinition = serde_json::from_str(json)?;
        view.validate()?;
        Ok(view)
    }

    pub fn metric(&self, id: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.id == id)
    }

    /// Builds the keyed filter collection, rejecting duplicate keys.
    pub fn filter_specs(&self) -> Result<FilterSpecs, DashboardError> {
        Ok(FilterSpecs::new(self.filters.clone())?)
    }

    /// Checks what serde cannot: unique keys and ids, and that every
    /// ranking and series names a declared metric.
    pub fn validate(&self) -> Result<(), DashboardError> {
        self.filter_specs()?;

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for metric in &self.metrics {
            if !seen.insert(metric.id.as_str()) {
                return Err(DashboardError::DuplicateMetric(metric.id.clone()));
            }
        }

        let references = self
            .rankings
            .iter()
            .map(|r| (format!("ranking '{}'", r.id), &r.metric))
            .chain(self.series.iter().map(|s| (format!("series '{}'", s.id), &s.metric)));
        for (context, metric) in references {
            if !seen.contains(metric.as_str()) {
                return Err(DashboardError::UnknownMetric {
                    context,
                    metric: metric.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Reads and validates a view definition file.
pub fn load_view(path: impl AsRef<Path>) -> Result<ViewDefinition, DashboardError> {
    let path = path.as_ref();
    log_enter_info!("config", "load_view", "{:?}", path);

    let json = std::fs::read_to_string(path).map_err(|source| DashboardError::ReadView {
        path: path.to_path_buf(),
        source,
    })?;
    let view = ViewDefinition::from_json_str(&json)?;
    log_exit_info!(
        "config",
        "load_view",
        "'{}': {} filters, {} metrics",
        view.name,
        view.filters.len(),
        view.metrics.len()
    );
    Ok(view)
}
