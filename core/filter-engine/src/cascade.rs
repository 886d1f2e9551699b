//! FILENAME: core/filter-engine/src/cascade.rs
//! PURPOSE: Cascading option lists for filter controls.
//! CONTEXT: A filter's menu is derived from the records that pass every OTHER
//! active filter, so all filters constrain each other in both directions while
//! a filter never narrows its own menu. The resolver is stateless; callers that
//! want memoisation hold an `OptionsCache`.

use std::borrow::Borrow;
use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use records::{extract, parse_date, Record, Value};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::apply::apply_filters_except;
use crate::definition::{ActiveFilterSet, FilterKind, FilterSpec, FilterSpecs, MatchMode, OptionsSource};
use crate::predicates::value_tokens;

/// The menu content of one filter control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OptionList {
    /// Unique values still reachable under the other filters.
    Values { values: Vec<String> },
    /// Caller-supplied list, never narrowed.
    Static { values: Vec<String> },
    /// Earliest and latest valid date under the other filters.
    #[serde(rename_all = "camelCase")]
    DateBounds {
        min_date: Option<NaiveDate>,
        max_date: Option<NaiveDate>,
    },
    /// Smallest and largest number under the other filters.
    NumericBounds { min: Option<f64>, max: Option<f64> },
    /// Free-text search has no menu.
    FreeText,
}

impl OptionList {
    pub fn is_empty(&self) -> bool {
        match self {
            OptionList::Values { values } | OptionList::Static { values } => values.is_empty(),
            OptionList::DateBounds { min_date, .. } => min_date.is_none(),
            OptionList::NumericBounds { min, .. } => min.is_none(),
            OptionList::FreeText => false,
        }
    }

    fn contains(&self, value: &str) -> bool {
        match self {
            OptionList::Values { values } | OptionList::Static { values } => values.iter().any(|v| v == value),
            _ => true,
        }
    }
}

/// Resolved options for one filter control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub key: String,
    pub options: OptionList,
    /// Nothing left to choose: the control should be hidden or disabled.
    pub hidden: bool,
    /// Currently selected values that are no longer offered. They stay in the
    /// active set; whether to reset them is the caller's decision.
    pub stale_selection: Vec<String>,
}

/// Options for the filter `key`, computed against every other active filter.
/// `None` if no filter declares `key`.
pub fn options_for<R: Borrow<Record>>(
    records: &[R],
    key: &str,
    active: &ActiveFilterSet,
    specs: &FilterSpecs,
) -> Option<FilterOptions> {
    let spec = specs.get(key)?;

    let options = match &spec.options_source {
        OptionsSource::Static(values) => OptionList::Static { values: values.clone() },
        OptionsSource::Derived => {
            let narrowed = apply_filters_except(records, active, specs, Some(key));
            derive_options(&narrowed, spec)
        }
    };

    Some(finish(spec, options, active))
}

/// Options for every declared filter, in declaration order.
pub fn resolve_options<R: Borrow<Record>>(
    records: &[R],
    active: &ActiveFilterSet,
    specs: &FilterSpecs,
) -> Vec<FilterOptions> {
    let resolved: Vec<FilterOptions> = specs
        .iter()
        .filter_map(|spec| options_for(records, &spec.key, active, specs))
        .collect();

    log::debug!(
        target: "cascade",
        "resolved {} filter menus over {} records ({} active values)",
        resolved.len(),
        records.len(),
        active.len()
    );
    resolved
}

fn derive_options(narrowed: &[&Record], spec: &FilterSpec) -> OptionList {
    match &spec.kind {
        FilterKind::DateRange { .. } => date_bounds(narrowed, spec),
        FilterKind::NumericRange => numeric_bounds(narrowed, spec),
        FilterKind::TextSearch { .. } => OptionList::FreeText,
        FilterKind::MultiSelect { .. } | FilterKind::SingleSelect { .. } => OptionList::Values {
            values: unique_sorted_values(narrowed, spec),
        },
    }
}

fn finish(spec: &FilterSpec, options: OptionList, active: &ActiveFilterSet) -> FilterOptions {
    let stale_selection = active
        .get(&spec.key)
        .filter(|value| value.is_active_for(spec))
        .map(|value| {
            value
                .selected()
                .into_iter()
                .filter(|selected| !options.contains(selected))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    FilterOptions {
        key: spec.key.clone(),
        hidden: options.is_empty(),
        options,
        stale_selection,
    }
}

/// Unique non-blank values of the filter's field (tokens for delimited
/// any/all multi-selects), excluding the `"Unknown"` placeholder.
fn unique_sorted_values(narrowed: &[&Record], spec: &FilterSpec) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();

    for record in narrowed {
        let value = match extract(record, &spec.field) {
            Some(v) if !v.is_missing() => v,
            _ => continue,
        };
        match token_delimiter(spec) {
            Some(delimiter) => seen.extend(value_tokens(value, delimiter)),
            None => {
                let display = value.display_value();
                if !display.trim().is_empty() {
                    seen.insert(display);
                }
            }
        }
    }

    let mut values: Vec<String> = seen.into_iter().collect();
    values.sort_by(|a, b| compare_option_values(a, b));
    values
}

/// Delimiter the menu is split on. Exact matching compares the raw value, so
/// its menu offers raw values too.
fn token_delimiter(spec: &FilterSpec) -> Option<&str> {
    match &spec.kind {
        FilterKind::MultiSelect {
            delimiter: Some(delimiter),
            match_mode: MatchMode::Any | MatchMode::All,
        } => Some(delimiter.as_str()),
        _ => None,
    }
}

/// Numbers sort numerically and before text; text sorts lexicographically.
fn compare_option_values(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>().ok(), b.parse::<f64>().ok()) {
        (Some(na), Some(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn date_bounds(narrowed: &[&Record], spec: &FilterSpec) -> OptionList {
    let mut min_date: Option<NaiveDate> = None;
    let mut max_date: Option<NaiveDate> = None;

    let dates = narrowed
        .iter()
        .filter_map(|record| extract(record, &spec.field))
        .filter_map(parse_date)
        .filter(|dt| dt.year() > records::date::MIN_BOUNDARY_YEAR)
        .map(|dt| dt.date());

    for date in dates {
        min_date = Some(min_date.map_or(date, |m| m.min(date)));
        max_date = Some(max_date.map_or(date, |m| m.max(date)));
    }

    OptionList::DateBounds { min_date, max_date }
}

fn numeric_bounds(narrowed: &[&Record], spec: &FilterSpec) -> OptionList {
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;

    let numbers = narrowed
        .iter()
        .filter_map(|record| extract(record, &spec.field))
        .filter_map(Value::as_number);

    for n in numbers {
        min = Some(min.map_or(n, |m| m.min(n)));
        max = Some(max.map_or(n, |m| m.max(n)));
    }

    OptionList::NumericBounds { min, max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FilterValue;
    use records::FieldPath;

    fn path(p: &str) -> FieldPath {
        FieldPath::parse(p).unwrap()
    }

    fn episodes() -> Vec<Record> {
        vec![
            Record::new().with("show", "Severance").with("season", 1).with("aired", "2022-02-18"),
            Record::new().with("show", "Severance").with("season", 2).with("aired", "2025-01-17"),
            Record::new().with("show", "Andor").with("season", 1).with("aired", "2022-09-21"),
            Record::new().with("show", "Unknown").with("season", 10).with("aired", "1970-01-01"),
            Record::new().with("show", "").with("season", 3).with("aired", "1899-12-31"),
        ]
    }

    fn specs() -> FilterSpecs {
        FilterSpecs::new(vec![
            FilterSpec::multi_select("show", path("show")),
            FilterSpec::single_select("season", path("season")),
            FilterSpec::date_range("aired", path("aired")),
        ])
        .unwrap()
    }

    #[test]
    fn values_exclude_blank_and_unknown() {
        let records = episodes();
        let options = options_for(&records, "show", &ActiveFilterSet::new(), &specs()).unwrap();
        assert_eq!(
            options.options,
            OptionList::Values {
                values: vec!["Andor".to_string(), "Severance".to_string()]
            }
        );
        assert!(!options.hidden);
    }

    #[test]
    fn numeric_options_sort_numerically() {
        let records = episodes();
        let options = options_for(&records, "season", &ActiveFilterSet::new(), &specs()).unwrap();
        assert_eq!(
            options.options,
            OptionList::Values {
                values: vec!["1".to_string(), "2".to_string(), "3".to_string(), "10".to_string()]
            }
        );
    }

    #[test]
    fn other_filters_narrow_but_own_selection_does_not() {
        let records = episodes();
        let active = ActiveFilterSet::new()
            .with("show", FilterValue::values(["Andor"]))
            .with("season", FilterValue::value("1"));

        let seasons = options_for(&records, "season", &active, &specs()).unwrap();
        assert_eq!(seasons.options, OptionList::Values { values: vec!["1".to_string()] });

        let shows = options_for(&records, "show", &active, &specs()).unwrap();
        assert_eq!(
            shows.options,
            OptionList::Values {
                values: vec!["Andor".to_string(), "Severance".to_string()]
            }
        );
    }

    #[test]
    fn date_bounds_skip_placeholder_dates() {
        let records = episodes();
        let options = options_for(&records, "aired", &ActiveFilterSet::new(), &specs()).unwrap();
        assert_eq!(
            options.options,
            OptionList::DateBounds {
                min_date: NaiveDate::from_ymd_opt(1970, 1, 1),
                max_date: NaiveDate::from_ymd_opt(2025, 1, 17),
            }
        );

        let active = ActiveFilterSet::new().with("show", FilterValue::values(["Severance"]));
        let options = options_for(&records, "aired", &active, &specs()).unwrap();
        assert_eq!(
            options.options,
            OptionList::DateBounds {
                min_date: NaiveDate::from_ymd_opt(2022, 2, 18),
                max_date: NaiveDate::from_ymd_opt(2025, 1, 17),
            }
        );
    }

    #[test]
    fn stale_selection_is_reported_not_cleared() {
        let records = episodes();
        let active = ActiveFilterSet::new()
            .with("show", FilterValue::values(["Andor"]))
            .with("season", FilterValue::value("2"));

        let seasons = options_for(&records, "season", &active, &specs()).unwrap();
        assert_eq!(seasons.stale_selection, vec!["2".to_string()]);
        assert_eq!(active.get("season"), Some(&FilterValue::value("2")));
    }

    #[test]
    fn static_sources_bypass_the_data() {
        let specs = FilterSpecs::new(vec![
            FilterSpec::single_select("show", path("show")).with_static_options(vec!["Dark".to_string()]),
        ])
        .unwrap();
        let options = options_for(&episodes(), "show", &ActiveFilterSet::new(), &specs).unwrap();
        assert_eq!(options.options, OptionList::Static { values: vec!["Dark".to_string()] });
    }

    #[test]
    fn empty_lists_hide_the_control() {
        let records: Vec<Record> = Vec::new();
        let all = resolve_options(&records, &ActiveFilterSet::new(), &specs());
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|o| o.hidden));
        assert!(options_for(&records, "missing", &ActiveFilterSet::new(), &specs()).is_none());
    }
}
