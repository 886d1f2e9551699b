//! FILENAME: core/metric-engine/src/grouped.rs
//! PURPOSE: Ranked per-group metrics ("top 10 actors by hours watched").
//! CONTEXT: Rows are grouped on a dimension field, optionally expanding a
//! delimited field so one record joins several groups. Each group is reduced
//! with the same accumulator the scalar KPIs use, then groups are ranked.

use std::borrow::Borrow;
use std::cmp::Ordering;

use records::{extract, split_tokens, DiagnosticSink, Record, Value};
use rustc_hash::FxHashMap;

use crate::accumulator::MetricAccumulator;
use crate::aggregate::finish;
use crate::definition::{conditions_match, DimensionSpec, MetricSpec, MetricValue, SortDirection};
use crate::view::GroupResult;

/// Joins label field values into a group label.
pub const LABEL_SEPARATOR: &str = " - ";

struct GroupState<'a> {
    key: String,
    first: &'a Record,
    acc: MetricAccumulator,
}

/// The `n` best groups in `direction`.
pub fn top_n<R: Borrow<Record>>(
    records: &[R],
    dimension: &DimensionSpec,
    metric: &MetricSpec,
    n: usize,
    direction: SortDirection,
    sink: &mut dyn DiagnosticSink,
) -> Vec<GroupResult> {
    let mut groups = group_metric(records, dimension, metric, direction, sink);
    groups.truncate(n);
    groups
}

/// Every group, ranked in `direction`.
pub fn group_metric<R: Borrow<Record>>(
    records: &[R],
    dimension: &DimensionSpec,
    metric: &MetricSpec,
    direction: SortDirection,
    sink: &mut dyn DiagnosticSink,
) -> Vec<GroupResult> {
    match &metric.data {
        Some(data) => group_rows(data.iter(), dimension, metric, direction, sink),
        None => group_rows(
            records.iter().map(|r| <R as Borrow<Record>>::borrow(r)),
            dimension,
            metric,
            direction,
            sink,
        ),
    }
}

fn group_rows<'a, I>(
    rows: I,
    dimension: &DimensionSpec,
    metric: &MetricSpec,
    direction: SortDirection,
    sink: &mut dyn DiagnosticSink,
) -> Vec<GroupResult>
where
    I: IntoIterator<Item = &'a Record>,
{
    let reducer = match metric.reducer() {
        Ok(reducer) => reducer,
        Err(diagnostic) => {
            sink.report(diagnostic);
            return Vec::new();
        }
    };

    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<GroupState<'a>> = Vec::new();

    for record in rows {
        let value = match extract(record, &dimension.field) {
            Some(value) if !value.is_missing() => value,
            _ => continue,
        };
        if !conditions_match(record, &metric.filter_conditions) {
            continue;
        }

        for key in dimension_keys(value, dimension.delimiter.as_deref()) {
            let idx = match index.get(&key) {
                Some(&idx) => idx,
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(GroupState {
                        key,
                        first: record,
                        acc: MetricAccumulator::new(),
                    });
                    groups.len() - 1
                }
            };
            groups[idx].acc.add(record, &reducer);
        }
    }

    let mut results: Vec<GroupResult> = groups
        .into_iter()
        .map(|group| GroupResult {
            display_label: display_label(group.first, dimension, &group.key),
            aggregated_value: finish(&group.acc, &reducer, metric),
            member_count: group.acc.rows as usize,
            key: group.key,
        })
        .collect();

    // Stable sort: equal values keep first-encounter order.
    match direction {
        SortDirection::Desc => results.sort_by(|a, b| compare_values(&b.aggregated_value, &a.aggregated_value)),
        SortDirection::Asc => results.sort_by(|a, b| compare_values(&a.aggregated_value, &b.aggregated_value)),
    }

    log::debug!(
        target: "metric",
        "{} by {}: {} groups",
        metric.id,
        dimension.id,
        results.len()
    );
    results
}

/// Grouping keys contributed by one dimension value. With a delimiter every
/// token is one expanded row, repeats included; only text is split.
fn dimension_keys(value: &Value, delimiter: Option<&str>) -> Vec<String> {
    match (delimiter, value) {
        (Some(delimiter), Value::Text(text)) => split_tokens(text, delimiter).map(str::to_string).collect(),
        (Some(_), _) => Vec::new(),
        (None, value) => vec![value.display_value().trim().to_string()],
    }
}

fn display_label(first: &Record, dimension: &DimensionSpec, key: &str) -> String {
    let parts: Vec<String> = dimension
        .label_fields
        .iter()
        .filter_map(|field| extract(first, field))
        .filter(|value| !value.is_blank())
        .map(Value::display_value)
        .collect();

    if parts.is_empty() {
        key.to_string()
    } else {
        parts.join(LABEL_SEPARATOR)
    }
}

/// Numbers order numerically and before text.
pub(crate) fn compare_values(a: &MetricValue, b: &MetricValue) -> Ordering {
    match (a, b) {
        (MetricValue::Number(x), MetricValue::Number(y)) => x.total_cmp(y),
        (MetricValue::Number(_), MetricValue::Text(_)) => Ordering::Less,
        (MetricValue::Text(_), MetricValue::Number(_)) => Ordering::Greater,
        (MetricValue::Text(x), MetricValue::Text(y)) => x.cmp(y),
    }
}
