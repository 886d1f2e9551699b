//! FILENAME: core/metric-engine/src/aggregate.rs
//! PURPOSE: Reduces a filtered collection to one KPI value.
//! CONTEXT: Evaluation is total. A metric declared without the field its
//! aggregation needs reports a diagnostic and yields its default; an empty
//! collection yields the aggregation's empty result.

use std::borrow::Borrow;

use records::{DiagnosticSink, Record};

use crate::accumulator::{empty_result, MetricAccumulator};
use crate::definition::{conditions_match, MetricSpec, MetricValue, Reducer};

/// Aggregates `records` (or the metric's own `data`) according to `metric`.
pub fn aggregate<R: Borrow<Record>>(records: &[R], metric: &MetricSpec, sink: &mut dyn DiagnosticSink) -> MetricValue {
    match &metric.data {
        Some(data) => aggregate_rows(data.iter(), metric, sink),
        None => aggregate_rows(records.iter().map(|r| <R as Borrow<Record>>::borrow(r)), metric, sink),
    }
}

/// Aggregates rows that have already been resolved and filtered. The
/// metric's `data` override is not consulted here.
pub fn aggregate_rows<'a, I>(rows: I, metric: &MetricSpec, sink: &mut dyn DiagnosticSink) -> MetricValue
where
    I: IntoIterator<Item = &'a Record>,
{
    let reducer = match metric.reducer() {
        Ok(reducer) => reducer,
        Err(diagnostic) => {
            sink.report(diagnostic);
            return metric.fallback();
        }
    };

    let mut acc = MetricAccumulator::new();
    for record in rows {
        if conditions_match(record, &metric.filter_conditions) {
            acc.add(record, &reducer);
        }
    }

    let value = finish(&acc, &reducer, metric);
    log::trace!(target: "metric", "{} over {} rows = {}", metric.id, acc.rows, value);
    value
}

/// Turns an accumulator into the metric's final value: default on empty,
/// then unit conversion, then rounding.
pub fn finish(acc: &MetricAccumulator, reducer: &Reducer, metric: &MetricSpec) -> MetricValue {
    match acc.compute(reducer) {
        Some(MetricValue::Number(n)) => MetricValue::Number(present(n, reducer, metric)),
        Some(text) => text,
        None => metric.default_value.clone().unwrap_or_else(|| empty_result(reducer)),
    }
}

/// Unit conversion and rounding for a raw numeric result.
pub(crate) fn present(raw: f64, reducer: &Reducer, metric: &MetricSpec) -> f64 {
    let converted = match (&metric.unit, reducer.is_measure()) {
        (Some(unit), true) => unit.apply(raw),
        _ => raw,
    };
    match metric.decimals {
        Some(decimals) => round_to(converted, decimals),
        None => converted,
    }
}

/// Rounds half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals.min(15) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Aggregation, UnitConversion};
    use records::{Diagnostic, DiagnosticCode, FieldPath};

    fn path(p: &str) -> FieldPath {
        FieldPath::parse(p).unwrap()
    }

    fn rows(values: &[f64]) -> Vec<Record> {
        values.iter().map(|v| Record::new().with("x", *v)).collect()
    }

    #[test]
    fn rounding_applies_to_the_final_value_only() {
        let records = rows(&[0.333, 0.333, 0.333]);
        let metric = MetricSpec::of("total", Aggregation::Sum, path("x")).with_decimals(2);
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert_eq!(aggregate(&records, &metric, &mut sink), MetricValue::Number(1.0));
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(1.2345, 2), 1.23);
    }

    #[test]
    fn unit_conversion_before_rounding() {
        let records = rows(&[1800.0, 2700.0]);
        let metric = MetricSpec::of("hours", Aggregation::Sum, path("x"))
            .with_unit(UnitConversion::SecondsToHours)
            .with_decimals(1);
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert_eq!(aggregate(&records, &metric, &mut sink), MetricValue::Number(1.3));
    }

    #[test]
    fn counts_ignore_units() {
        let records = rows(&[1.0, 2.0]);
        let metric = MetricSpec::count("rows").with_unit(UnitConversion::Factor(10.0));
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert_eq!(aggregate(&records, &metric, &mut sink), MetricValue::Number(2.0));
    }

    #[test]
    fn misconfiguration_reports_and_returns_default() {
        let records = rows(&[1.0]);
        let metric = MetricSpec::new("avg", Aggregation::Average).with_default(-1.0);
        let mut sink: Vec<Diagnostic> = Vec::new();

        assert_eq!(aggregate(&records, &metric, &mut sink), MetricValue::Number(-1.0));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, DiagnosticCode::MissingField);
    }

    #[test]
    fn data_override_replaces_input() {
        let metric = MetricSpec::of("total", Aggregation::Sum, path("x")).with_data(rows(&[100.0, 200.0]));
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert_eq!(aggregate(&rows(&[1.0]), &metric, &mut sink), MetricValue::Number(300.0));
    }
}
