//! FILENAME: app/dashboard/src/evaluate.rs
//! PURPOSE: One-call evaluation of a view against a record collection.
//! CONTEXT: Runs the whole read path: validate the active set, filter,
//! resolve cascading menus, then compute KPIs, rankings and series over the
//! filtered rows. Nothing is retained between calls except the caller's cache.

use std::borrow::Borrow;

use filter_engine::{
    apply_filters, check_active_set, resolve_options, ActiveFilterSet, FilterOptions, FilterSpecs, OptionsCache,
};
use metric_engine::{aggregate, time_series, top_n, GroupResult, KpiValue, MetricSpec, SeriesOptions, SeriesPoint};
use records::{DiagnosticSink, Record};
use serde::{Deserialize, Serialize};

use crate::config::ViewDefinition;
use crate::error::DashboardError;
use crate::{log_enter, log_exit};

// ============================================================================
// SNAPSHOT (what the page renders)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResult {
    pub id: String,
    pub groups: Vec<GroupResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResult {
    pub id: String,
    pub points: Vec<SeriesPoint>,
}

/// Everything a view needs to render for one active filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub name: String,
    pub total_count: usize,
    pub filtered_count: usize,
    pub kpis: Vec<KpiValue>,
    pub rankings: Vec<RankingResult>,
    pub series: Vec<SeriesResult>,
    pub filter_options: Vec<FilterOptions>,
}

// ============================================================================
// DASHBOARD
// ============================================================================

/// A validated view ready for evaluation.
#[derive(Debug, Clone)]
pub struct Dashboard {
    view: ViewDefinition,
    specs: FilterSpecs,
}

impl Dashboard {
    pub fn new(view: ViewDefinition) -> Result<Self, DashboardError> {
        view.validate()?;
        let specs = view.filter_specs()?;
        Ok(Dashboard { view, specs })
    }

    pub fn view(&self) -> &ViewDefinition {
        &self.view
    }

    pub fn specs(&self) -> &FilterSpecs {
        &self.specs
    }

    /// Evaluates the view. Never fails: misconfiguration and unusable
    /// selections are reported to `sink` and evaluated with safe defaults.
    pub fn evaluate<R: Borrow<Record>>(
        &self,
        records: &[R],
        active: &ActiveFilterSet,
        sink: &mut dyn DiagnosticSink,
    ) -> ViewSnapshot {
        log_enter!("view", "evaluate", "view={} records={} active={}", self.view.name, records.len(), active.len());

        check_active_set(active, &self.specs, sink);
        let filter_options = resolve_options(records, active, &self.specs);
        let snapshot = self.snapshot(records, active, filter_options, sink);

        log_exit!("view", "evaluate", "filtered={}/{}", snapshot.filtered_count, snapshot.total_count);
        snapshot
    }

    /// Like [`Dashboard::evaluate`], with menus served from `cache`.
    /// `dataset_version` must change whenever `records` does.
    pub fn evaluate_cached<R: Borrow<Record>>(
        &self,
        dataset_version: u64,
        records: &[R],
        active: &ActiveFilterSet,
        cache: &mut OptionsCache,
        sink: &mut dyn DiagnosticSink,
    ) -> ViewSnapshot {
        log_enter!("view", "evaluate_cached", "view={} version={}", self.view.name, dataset_version);

        check_active_set(active, &self.specs, sink);
        let filter_options = cache.get_or_resolve(dataset_version, records, active, &self.specs).to_vec();
        let snapshot = self.snapshot(records, active, filter_options, sink);

        log_exit!("view", "evaluate_cached", "cache={:?}", cache.stats());
        snapshot
    }

    fn snapshot<R: Borrow<Record>>(
        &self,
        records: &[R],
        active: &ActiveFilterSet,
        filter_options: Vec<FilterOptions>,
        sink: &mut dyn DiagnosticSink,
    ) -> ViewSnapshot {
        let filtered = apply_filters(records, active, &self.specs);

        let kpis = self
            .view
            .metrics
            .iter()
            .map(|metric| KpiValue::new(metric, aggregate(&filtered, metric, sink)))
            .collect();

        let mut rankings = Vec::with_capacity(self.view.rankings.len());
        for ranking in &self.view.rankings {
            let groups = match self.metric(&ranking.metric) {
                Some(metric) => top_n(&filtered, &ranking.dimension, metric, ranking.limit, ranking.direction, sink),
                None => Vec::new(),
            };
            rankings.push(RankingResult {
                id: ranking.id.clone(),
                groups,
            });
        }

        let mut series = Vec::with_capacity(self.view.series.len());
        for chart in &self.view.series {
            let points = match self.metric(&chart.metric) {
                Some(metric) => time_series(
                    &filtered,
                    &chart.date_field,
                    chart.period,
                    metric,
                    SeriesOptions {
                        fill_gaps: chart.fill_gaps,
                    },
                    sink,
                ),
                None => Vec::new(),
            };
            series.push(SeriesResult {
                id: chart.id.clone(),
                points,
            });
        }

        ViewSnapshot {
            name: self.view.name.clone(),
            total_count: records.len(),
            filtered_count: filtered.len(),
            kpis,
            rankings,
            series,
            filter_options,
        }
    }

    // References were checked in `new`.
    fn metric(&self, id: &str) -> Option<&MetricSpec> {
        self.view.metric(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_engine::{FilterSpec, FilterValue};
    use metric_engine::{Aggregation, MetricValue};
    use records::{Diagnostic, FieldPath};

    fn path(p: &str) -> FieldPath {
        FieldPath::parse(p).unwrap()
    }

    fn books() -> Vec<Record> {
        [("Dune", "sci-fi", 412.0), ("Emma", "classic", 474.0), ("Solaris", "sci-fi", 204.0)]
            .iter()
            .map(|(title, genre, pages)| Record::new().with("title", *title).with("genre", *genre).with("pages", *pages))
            .collect()
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(ViewDefinition {
            name: "Reading".to_string(),
            filters: vec![FilterSpec::multi_select("genre", path("genre"))],
            metrics: vec![
                MetricSpec::count("books"),
                MetricSpec::of("pages", Aggregation::Sum, path("pages")),
            ],
            ..ViewDefinition::default()
        })
        .unwrap()
    }

    #[test]
    fn kpis_follow_the_active_filters() {
        let records = books();
        let active = ActiveFilterSet::new().with("genre", FilterValue::values(["sci-fi"]));
        let mut sink: Vec<Diagnostic> = Vec::new();

        let snapshot = dashboard().evaluate(&records, &active, &mut sink);
        assert_eq!(snapshot.total_count, 3);
        assert_eq!(snapshot.filtered_count, 2);
        assert_eq!(snapshot.kpis[0].value, MetricValue::Number(2.0));
        assert_eq!(snapshot.kpis[1].value, MetricValue::Number(616.0));
        assert!(sink.is_empty());
    }

    #[test]
    fn undeclared_keys_are_reported_and_ignored() {
        let records = books();
        let active = ActiveFilterSet::new().with("author", FilterValue::values(["Lem"]));
        let mut sink: Vec<Diagnostic> = Vec::new();

        let snapshot = dashboard().evaluate(&records, &active, &mut sink);
        assert_eq!(snapshot.filtered_count, 3);
        assert_eq!(sink.len(), 1);
    }
}
