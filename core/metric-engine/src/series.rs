//! FILENAME: core/metric-engine/src/series.rs
//! PURPOSE: Time-bucketed metrics for trend charts.
//! CONTEXT: Same reduction as the ranked groups, with the grouping key
//! replaced by the start date of the period a record's date falls in. Buckets
//! come out in ascending date order. `cumsum` turns into a running total here.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use chrono::{Datelike, Days, Duration, Months, NaiveDate};
use records::{extract, is_set_date, parse_date, DiagnosticSink, FieldPath, Record};
use serde::{Deserialize, Serialize};

use crate::accumulator::MetricAccumulator;
use crate::aggregate::{finish, present};
use crate::definition::{conditions_match, DatePeriod, MetricSpec, MetricValue, Reducer};
use crate::view::SeriesPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOptions {
    /// Emit zero-valued buckets for periods with no rows.
    #[serde(default)]
    pub fill_gaps: bool,
}

/// Aggregates `metric` per period of `date_field`.
pub fn time_series<R: Borrow<Record>>(
    records: &[R],
    date_field: &FieldPath,
    period: DatePeriod,
    metric: &MetricSpec,
    options: SeriesOptions,
    sink: &mut dyn DiagnosticSink,
) -> Vec<SeriesPoint> {
    match &metric.data {
        Some(data) => series_rows(data.iter(), date_field, period, metric, options, sink),
        None => series_rows(
            records.iter().map(|r| <R as Borrow<Record>>::borrow(r)),
            date_field,
            period,
            metric,
            options,
            sink,
        ),
    }
}

fn series_rows<'a, I>(
    rows: I,
    date_field: &FieldPath,
    period: DatePeriod,
    metric: &MetricSpec,
    options: SeriesOptions,
    sink: &mut dyn DiagnosticSink,
) -> Vec<SeriesPoint>
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

    let mut buckets: BTreeMap<NaiveDate, MetricAccumulator> = BTreeMap::new();
    for record in rows {
        let date = match extract(record, date_field).and_then(parse_date) {
            Some(dt) if is_set_date(&dt) => dt.date(),
            _ => continue,
        };
        if !conditions_match(record, &metric.filter_conditions) {
            continue;
        }
        buckets
            .entry(bucket_start(date, period))
            .or_default()
            .add(record, &reducer);
    }

    if options.fill_gaps {
        fill_gaps(&mut buckets, period);
    }

    let cumulative = matches!(reducer, Reducer::Cumsum { .. });
    let mut running = MetricAccumulator::new();

    buckets
        .into_iter()
        .map(|(bucket, acc)| {
            let value = if cumulative {
                running.merge(&acc);
                MetricValue::Number(present(running.sum, &reducer, metric))
            } else if acc.rows == 0 {
                MetricValue::Number(0.0)
            } else {
                finish(&acc, &reducer, metric)
            };
            SeriesPoint {
                bucket,
                label: bucket_label(bucket, period),
                value,
                member_count: acc.rows as usize,
            }
        })
        .collect()
}

fn fill_gaps(buckets: &mut BTreeMap<NaiveDate, MetricAccumulator>, period: DatePeriod) {
    let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return,
    };

    let mut current = first;
    while current < last {
        match next_bucket(current, period) {
            Some(next) => {
                buckets.entry(next).or_default();
                current = next;
            }
            None => break,
        }
    }
}

/// First day of the period containing `date`.
pub fn bucket_start(date: NaiveDate, period: DatePeriod) -> NaiveDate {
    match period {
        DatePeriod::Day => date,
        DatePeriod::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        DatePeriod::Month => date.with_day(1).unwrap_or(date),
        DatePeriod::Quarter => {
            let month = (date.month() - 1) / 3 * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
        }
        DatePeriod::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

fn next_bucket(bucket: NaiveDate, period: DatePeriod) -> Option<NaiveDate> {
    match period {
        DatePeriod::Day => bucket.succ_opt(),
        DatePeriod::Week => bucket.checked_add_days(Days::new(7)),
        DatePeriod::Month => bucket.checked_add_months(Months::new(1)),
        DatePeriod::Quarter => bucket.checked_add_months(Months::new(3)),
        DatePeriod::Year => bucket.checked_add_months(Months::new(12)),
    }
}

/// Axis label for a bucket: `2024-03-09`, `2024-W10`, `2024-03`, `2024-Q1`, `2024`.
pub fn bucket_label(bucket: NaiveDate, period: DatePeriod) -> String {
    match period {
        DatePeriod::Day => bucket.format("%Y-%m-%d").to_string(),
        DatePeriod::Week => {
            let week = bucket.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        DatePeriod::Month => bucket.format("%Y-%m").to_string(),
        DatePeriod::Quarter => format!("{}-Q{}", bucket.year(), (bucket.month() - 1) / 3 + 1),
        DatePeriod::Year => bucket.year().to_string(),
    }
}
