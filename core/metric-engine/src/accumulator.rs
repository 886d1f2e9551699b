//! FILENAME: core/metric-engine/src/accumulator.rs
//! PURPOSE: Incremental state for one metric over one group of rows.
//! CONTEXT: Scalar KPIs, ranked groups and time buckets all feed rows into an
//! accumulator and finish it with the same reducer, so every view computes a
//! given aggregation identically. Only the state the reducer needs is kept.

use records::{day_key, extract, parse_date_str, Record, Value};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::definition::{MetricValue, Reducer, MODE_EMPTY_LABEL};

/// Accumulator for computing one reducer incrementally.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    /// Rows seen, whether or not they contributed a value.
    pub rows: u64,
    pub sum: f64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Kept for medians only.
    numbers: Vec<f64>,
    distinct: FxHashSet<String>,
    /// Mode candidates in first-encounter order.
    frequencies: Vec<(String, u64)>,
    frequency_index: FxHashMap<String, usize>,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one row.
    pub fn add(&mut self, record: &Record, reducer: &Reducer) {
        self.rows += 1;

        let value = match reducer.field() {
            Some(field) => match extract(record, field) {
                Some(value) => value,
                None => return,
            },
            None => return,
        };

        match reducer {
            Reducer::Count => {}
            Reducer::CountDistinct { .. } => {
                if let Some(key) = distinct_key(value) {
                    self.distinct.insert(key);
                }
            }
            Reducer::Mode { .. } => {
                if !value.is_blank() {
                    self.add_mode_key(value.display_value(), 1);
                }
            }
            Reducer::Average { filter_zeros: true, .. } => {
                if let Some(n) = value.as_number().filter(|n| *n != 0.0) {
                    self.add_number(n);
                }
            }
            Reducer::Median { .. } => {
                if let Some(n) = value.as_number() {
                    self.numbers.push(n);
                    self.add_number(n);
                }
            }
            Reducer::Sum { .. }
            | Reducer::Cumsum { .. }
            | Reducer::Average { .. }
            | Reducer::Min { .. }
            | Reducer::Max { .. } => {
                if let Some(n) = value.as_number() {
                    self.add_number(n);
                }
            }
        }
    }

    fn add_number(&mut self, value: f64) {
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn add_mode_key(&mut self, key: String, count: u64) {
        match self.frequency_index.get(&key) {
            Some(&idx) => self.frequencies[idx].1 += count,
            None => {
                self.frequency_index.insert(key.clone(), self.frequencies.len());
                self.frequencies.push((key, count));
            }
        }
    }

    /// Raw result before unit conversion and rounding. `None` means there
    /// was nothing to reduce and the metric's default applies.
    pub fn compute(&self, reducer: &Reducer) -> Option<MetricValue> {
        match reducer {
            Reducer::Count => Some(MetricValue::Number(self.rows as f64)),
            Reducer::CountDistinct { .. } => Some(MetricValue::Number(self.distinct.len() as f64)),
            Reducer::Sum { .. } | Reducer::Cumsum { .. } => Some(MetricValue::Number(self.sum)),
            Reducer::Average { .. } => {
                if self.count_numbers > 0 {
                    Some(MetricValue::Number(self.sum / self.count_numbers as f64))
                } else {
                    None
                }
            }
            Reducer::Median { .. } => median(&self.numbers).map(MetricValue::Number),
            Reducer::Min { .. } => self.min.map(MetricValue::Number),
            Reducer::Max { .. } => self.max.map(MetricValue::Number),
            Reducer::Mode { .. } => self.mode().map(|key| MetricValue::Text(key.to_string())),
        }
    }

    /// Most frequent key; ties go to the key seen first.
    fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, u64)> = None;
        for entry in &self.frequencies {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(key, _)| key.as_str())
    }

    /// Merges another accumulator for the same reducer into this one.
    pub fn merge(&mut self, other: &MetricAccumulator) {
        self.rows += other.rows;
        self.sum += other.sum;
        self.count_numbers += other.count_numbers;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
        self.numbers.extend_from_slice(&other.numbers);
        self.distinct.extend(other.distinct.iter().cloned());
        for (key, count) in &other.frequencies {
            self.add_mode_key(key.clone(), *count);
        }
    }
}

/// Empty result for a reducer when no default is configured.
pub fn empty_result(reducer: &Reducer) -> MetricValue {
    match reducer {
        Reducer::Mode { .. } => MetricValue::Text(MODE_EMPTY_LABEL.to_string()),
        _ => MetricValue::Number(0.0),
    }
}

/// Key used for distinct counting. Dates collapse to their calendar day.
fn distinct_key(value: &Value) -> Option<String> {
    match value {
        _ if value.is_blank() => None,
        Value::Date(dt) => Some(day_key(dt)),
        Value::Text(text) => Some(
            parse_date_str(text)
                .map(|dt| day_key(&dt))
                .unwrap_or_else(|| text.clone()),
        ),
        other => Some(other.display_value()),
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
