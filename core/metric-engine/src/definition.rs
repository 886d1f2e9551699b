//! FILENAME: core/metric-engine/src/definition.rs
//! PURPOSE: Declarative metric and dimension configuration.
//! CONTEXT: Views declare metrics as flat option bags (`aggregation`, `field`,
//! `decimals`, ...). Before evaluation a `MetricSpec` is lowered to a `Reducer`
//! that carries only what its aggregation needs, so a missing field is caught
//! once, up front, instead of inside every reduction.

use std::fmt;
use std::sync::Arc;

use filter_engine::{comparison_op, ComparisonOperator};
use records::{extract, Diagnostic, DiagnosticCode, FieldPath, Record, Value};
use serde::{Deserialize, Serialize};

/// Result shown when a mode has nothing to count.
pub const MODE_EMPTY_LABEL: &str = "N/A";

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Count,
    #[serde(alias = "countDistinct")]
    CountDistinct,
    Sum,
    Average,
    Median,
    Min,
    Max,
    Mode,
    /// Running sum across time buckets; a plain sum on a flat collection.
    Cumsum,
}

impl Aggregation {
    pub fn needs_field(&self) -> bool {
        !matches!(self, Aggregation::Count)
    }
}

/// Conversion applied to numeric results before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitConversion {
    SecondsToMinutes,
    SecondsToHours,
    MinutesToHours,
    /// Multiply by an arbitrary factor.
    Factor(f64),
}

impl UnitConversion {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            UnitConversion::SecondsToMinutes => value / 60.0,
            UnitConversion::SecondsToHours => value / 3600.0,
            UnitConversion::MinutesToHours => value / 60.0,
            UnitConversion::Factor(factor) => value * factor,
        }
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Metric-level filter condition. Conditions on one metric are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: FieldPath,
    #[serde(default)]
    pub operator: ComparisonOperator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: FieldPath, operator: ComparisonOperator, value: impl Into<Value>) -> Self {
        Condition {
            field,
            operator,
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        comparison_op(extract(record, &self.field), self.operator, &self.value)
    }
}

/// True if `record` passes every condition.
pub fn conditions_match(record: &Record, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| condition.matches(record))
}

// ============================================================================
// METRIC VALUES
// ============================================================================

/// The scalar a metric reduces to. Only `mode` produces text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            MetricValue::Number(_) => None,
        }
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::Number(0.0)
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// METRIC SPEC
// ============================================================================

/// Display metadata handed through to KPI renderers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDisplay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Abbreviate large numbers with K/M.
    #[serde(default)]
    pub compact_numbers: bool,
}

/// Declaration of how to reduce a record collection to one value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    /// Unique id within the view.
    #[serde(alias = "value")]
    pub id: String,

    pub aggregation: Aggregation,

    /// Required for every aggregation except `count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldPath>,

    /// Rounds the final result only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_conditions: Vec<Condition>,

    /// `average` only: drop zeros and non-numbers first.
    #[serde(default)]
    pub filter_zeros: bool,

    /// Result when there is nothing to reduce (and on misconfiguration).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<MetricValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitConversion>,

    #[serde(flatten)]
    pub display: MetricDisplay,

    /// Collection used instead of the view's records.
    #[serde(skip)]
    pub data: Option<Arc<[Record]>>,
}

impl MetricSpec {
    pub fn new(id: impl Into<String>, aggregation: Aggregation) -> Self {
        MetricSpec {
            id: id.into(),
            aggregation,
            ..Default::default()
        }
    }

    pub fn count(id: impl Into<String>) -> Self {
        Self::new(id, Aggregation::Count)
    }

    pub fn of(id: impl Into<String>, aggregation: Aggregation, field: FieldPath) -> Self {
        Self::new(id, aggregation).with_field(field)
    }

    pub fn with_field(mut self, field: FieldPath) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.filter_conditions.push(condition);
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn with_default(mut self, value: impl Into<MetricValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_unit(mut self, unit: UnitConversion) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn filtering_zeros(mut self) -> Self {
        self.filter_zeros = true;
        self
    }

    pub fn with_data(mut self, data: impl Into<Arc<[Record]>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Lowers the declaration to its typed reducer.
    pub fn reducer(&self) -> Result<Reducer, Diagnostic> {
        if self.aggregation == Aggregation::Count {
            return Ok(Reducer::Count);
        }

        let field = match &self.field {
            Some(field) => field.clone(),
            None => {
                return Err(Diagnostic::warning(
                    DiagnosticCode::MissingField,
                    &self.id,
                    format!("{:?} requires a field", self.aggregation),
                ))
            }
        };

        Ok(match self.aggregation {
            Aggregation::Count => Reducer::Count,
            Aggregation::CountDistinct => Reducer::CountDistinct { field },
            Aggregation::Sum => Reducer::Sum { field },
            Aggregation::Average => Reducer::Average {
                field,
                filter_zeros: self.filter_zeros,
            },
            Aggregation::Median => Reducer::Median { field },
            Aggregation::Min => Reducer::Min { field },
            Aggregation::Max => Reducer::Max { field },
            Aggregation::Mode => Reducer::Mode { field },
            Aggregation::Cumsum => Reducer::Cumsum { field },
        })
    }

    /// Value returned on misconfiguration.
    pub fn fallback(&self) -> MetricValue {
        self.default_value.clone().unwrap_or_default()
    }
}

/// Typed form of a `MetricSpec`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reducer {
    Count,
    CountDistinct { field: FieldPath },
    Sum { field: FieldPath },
    Average { field: FieldPath, filter_zeros: bool },
    Median { field: FieldPath },
    Min { field: FieldPath },
    Max { field: FieldPath },
    Mode { field: FieldPath },
    Cumsum { field: FieldPath },
}

impl Reducer {
    pub fn field(&self) -> Option<&FieldPath> {
        match self {
            Reducer::Count => None,
            Reducer::CountDistinct { field }
            | Reducer::Sum { field }
            | Reducer::Average { field, .. }
            | Reducer::Median { field }
            | Reducer::Min { field }
            | Reducer::Max { field }
            | Reducer::Mode { field }
            | Reducer::Cumsum { field } => Some(field),
        }
    }

    /// Whether unit conversion and rounding apply to the result.
    pub fn is_measure(&self) -> bool {
        !matches!(self, Reducer::Count | Reducer::CountDistinct { .. } | Reducer::Mode { .. })
    }
}

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Grouping key for ranked lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    #[serde(alias = "value")]
    pub id: String,

    pub field: FieldPath,

    /// Fields joined into the group label, read from the group's first member.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_fields: Vec<FieldPath>,

    /// Expand one record into one row per token of `field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl DimensionSpec {
    pub fn new(id: impl Into<String>, field: FieldPath) -> Self {
        DimensionSpec {
            id: id.into(),
            field,
            label_fields: Vec::new(),
            delimiter: None,
        }
    }

    pub fn delimited(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_labels(mut self, label_fields: Vec<FieldPath>) -> Self {
        self.label_fields = label_fields;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Time bucket size for series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePeriod {
    Day,
    /// ISO weeks, starting Monday.
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}
