//! FILENAME: core/filter-engine/src/definition.rs
//! Filter Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a view's filters.
//! These structures are designed to be:
//! - Serializable (views are declared in JSON)
//! - Declared once per view and never mutated afterwards
//! - Separate from the current selection, which the caller owns and passes in

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use records::FieldPath;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Sentinel single-select value meaning "no filter".
pub const ALL_SENTINEL: &str = "all";

// ============================================================================
// FILTER KINDS
// ============================================================================

/// How a delimited multi-select value is matched against the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// The raw, undelimited string must equal one of the selected values.
    Exact,
    /// At least one token must be selected.
    #[default]
    Any,
    /// Every selected value must appear among the tokens.
    All,
}

/// The filter type, carrying only the settings that type uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterKind {
    #[serde(rename_all = "camelCase")]
    DateRange {
        /// Reject unparseable and epoch-default dates.
        #[serde(default = "default_true")]
        strict: bool,
    },
    #[serde(rename_all = "camelCase")]
    MultiSelect {
        #[serde(default)]
        delimiter: Option<String>,
        #[serde(default)]
        match_mode: MatchMode,
    },
    #[serde(rename_all = "camelCase")]
    SingleSelect {
        /// Selecting this value (like `"all"`) means "no filter".
        #[serde(default)]
        default_value: Option<String>,
    },
    NumericRange,
    #[serde(rename_all = "camelCase")]
    TextSearch {
        /// Fields searched; empty means the filter's own field.
        #[serde(default)]
        fields: Vec<FieldPath>,
        #[serde(default)]
        case_sensitive: bool,
    },
}

fn default_true() -> bool {
    true
}

/// Where a filter's menu comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionsSource {
    /// Computed from the data, narrowed by the other active filters.
    #[default]
    Derived,
    /// Fixed list supplied by the view.
    Static(Vec<String>),
}

// ============================================================================
// FILTER SPEC
// ============================================================================

/// Static declaration of one filter control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Unique id within the view.
    pub key: String,

    /// Record field the filter reads.
    pub field: FieldPath,

    #[serde(flatten)]
    pub kind: FilterKind,

    #[serde(default)]
    pub options_source: OptionsSource,

    /// Control caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FilterSpec {
    pub fn new(key: impl Into<String>, field: FieldPath, kind: FilterKind) -> Self {
        FilterSpec {
            key: key.into(),
            field,
            kind,
            options_source: OptionsSource::Derived,
            label: None,
        }
    }

    pub fn date_range(key: impl Into<String>, field: FieldPath) -> Self {
        Self::new(key, field, FilterKind::DateRange { strict: true })
    }

    pub fn multi_select(key: impl Into<String>, field: FieldPath) -> Self {
        Self::new(
            key,
            field,
            FilterKind::MultiSelect {
                delimiter: None,
                match_mode: MatchMode::Any,
            },
        )
    }

    /// Multi-select over a delimited field (e.g. a comma-separated genre list).
    pub fn delimited(key: impl Into<String>, field: FieldPath, delimiter: &str, match_mode: MatchMode) -> Self {
        Self::new(
            key,
            field,
            FilterKind::MultiSelect {
                delimiter: Some(delimiter.to_string()),
                match_mode,
            },
        )
    }

    pub fn single_select(key: impl Into<String>, field: FieldPath) -> Self {
        Self::new(key, field, FilterKind::SingleSelect { default_value: None })
    }

    pub fn numeric_range(key: impl Into<String>, field: FieldPath) -> Self {
        Self::new(key, field, FilterKind::NumericRange)
    }

    pub fn text_search(key: impl Into<String>, field: FieldPath, fields: Vec<FieldPath>) -> Self {
        Self::new(
            key,
            field,
            FilterKind::TextSearch {
                fields,
                case_sensitive: false,
            },
        )
    }

    pub fn with_static_options(mut self, options: Vec<String>) -> Self {
        self.options_source = OptionsSource::Static(options);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Delimiter of a multi-select filter, if any.
    pub fn delimiter(&self) -> Option<&str> {
        match &self.kind {
            FilterKind::MultiSelect { delimiter, .. } => delimiter.as_deref(),
            _ => None,
        }
    }
}

/// The declared filters of a view, in declaration order, addressable by key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<FilterSpec>", into = "Vec<FilterSpec>")]
pub struct FilterSpecs {
    specs: Vec<FilterSpec>,
    index: FxHashMap<String, usize>,
}

impl FilterSpecs {
    /// Builds the registry, rejecting duplicate keys.
    pub fn new(specs: Vec<FilterSpec>) -> Result<Self, FilterError> {
        let mut index = FxHashMap::default();
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.key.clone(), i).is_some() {
                return Err(FilterError::DuplicateKey(spec.key.clone()));
            }
        }
        Ok(FilterSpecs { specs, index })
    }

    pub fn get(&self, key: &str) -> Option<&FilterSpec> {
        self.index.get(key).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl TryFrom<Vec<FilterSpec>> for FilterSpecs {
    type Error = FilterError;

    fn try_from(specs: Vec<FilterSpec>) -> Result<Self, Self::Error> {
        FilterSpecs::new(specs)
    }
}

impl From<FilterSpecs> for Vec<FilterSpec> {
    fn from(specs: FilterSpecs) -> Self {
        specs.specs
    }
}

// ============================================================================
// FILTER VALUES (CURRENT SELECTION)
// ============================================================================

/// Selected date window. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DateSelection {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Selected numeric window. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSelection {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// The current value of one filter control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Multi-select selection.
    Values(Vec<String>),
    /// Date-range selection.
    Dates(DateSelection),
    /// Numeric-range selection.
    Range(RangeSelection),
    /// Single-select value or search term.
    Value(String),
}

impl FilterValue {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::Values(values.into_iter().map(Into::into).collect())
    }

    pub fn dates(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        FilterValue::Dates(DateSelection { start_date, end_date })
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::Range(RangeSelection { min, max })
    }

    pub fn value(value: impl Into<String>) -> Self {
        FilterValue::Value(value.into())
    }

    /// True if the shape of this value is the one `spec`'s type reads.
    pub fn fits(&self, spec: &FilterSpec) -> bool {
        matches!(
            (&spec.kind, self),
            (FilterKind::DateRange { .. }, FilterValue::Dates(_))
                | (FilterKind::MultiSelect { .. }, FilterValue::Values(_))
                | (FilterKind::SingleSelect { .. }, FilterValue::Value(_))
                | (FilterKind::NumericRange, FilterValue::Range(_))
                | (FilterKind::TextSearch { .. }, FilterValue::Value(_))
        )
    }

    /// False for unset values (empty list, open window, `"all"`, blank term)
    /// and for values whose shape does not fit `spec`. Inactive values are
    /// skipped when filtering.
    pub fn is_active_for(&self, spec: &FilterSpec) -> bool {
        match (&spec.kind, self) {
            (FilterKind::DateRange { .. }, FilterValue::Dates(d)) => {
                d.start_date.is_some() || d.end_date.is_some()
            }
            (FilterKind::MultiSelect { .. }, FilterValue::Values(v)) => !v.is_empty(),
            (FilterKind::SingleSelect { default_value }, FilterValue::Value(s)) => {
                let s = s.trim();
                !s.is_empty()
                    && !s.eq_ignore_ascii_case(ALL_SENTINEL)
                    && default_value.as_deref() != Some(s)
            }
            (FilterKind::NumericRange, FilterValue::Range(r)) => r.min.is_some() || r.max.is_some(),
            (FilterKind::TextSearch { .. }, FilterValue::Value(s)) => !s.trim().is_empty(),
            _ => false,
        }
    }

    /// The selected option values, for list-style filters.
    pub fn selected(&self) -> Vec<&str> {
        match self {
            FilterValue::Values(v) => v.iter().map(String::as_str).collect(),
            FilterValue::Value(s) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }
}

impl Hash for FilterValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FilterValue::Values(v) => v.hash(state),
            FilterValue::Dates(d) => d.hash(state),
            FilterValue::Range(r) => {
                r.min.map(f64::to_bits).hash(state);
                r.max.map(f64::to_bits).hash(state);
            }
            FilterValue::Value(s) => s.hash(state),
        }
    }
}

// ============================================================================
// ACTIVE FILTER SET
// ============================================================================

/// The caller-owned mapping from filter key to current value.
/// Ordered so iteration and fingerprints are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilterSet {
    values: BTreeMap<String, FilterValue>,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        ActiveFilterSet {
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: FilterValue) -> Option<FilterValue> {
        self.values.insert(key.into(), value)
    }

    pub fn clear(&mut self, key: &str) -> Option<FilterValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of this set without `key`.
    pub fn without(&self, key: &str) -> ActiveFilterSet {
        let mut values = self.values.clone();
        values.remove(key);
        ActiveFilterSet { values }
    }

    /// Stable hash of the whole selection, used as a cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
