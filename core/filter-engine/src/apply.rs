//! FILENAME: core/filter-engine/src/apply.rs
//! PURPOSE: Narrows a record collection by the active filter set.
//! CONTEXT: Filters combine with AND semantics, so the order keys are visited
//! in never changes the result. Output borrows from the input and keeps its
//! order, which makes filtering stable and repeatable.

use std::borrow::Borrow;

use records::{extract, Diagnostic, DiagnosticCode, DiagnosticSink, Record};

use crate::definition::{ActiveFilterSet, FilterKind, FilterSpec, FilterSpecs, FilterValue};
use crate::predicates::{date_in_range, multi_select_match, numeric_range, text_search_match};

/// Applies every active filter. Works on owned records and on a previously
/// filtered `&[&Record]` alike.
pub fn apply_filters<'a, R: Borrow<Record>>(
    records: &'a [R],
    active: &ActiveFilterSet,
    specs: &FilterSpecs,
) -> Vec<&'a Record> {
    apply_filters_except(records, active, specs, None)
}

/// Applies every active filter except `skip_key`.
pub fn apply_filters_except<'a, R: Borrow<Record>>(
    records: &'a [R],
    active: &ActiveFilterSet,
    specs: &FilterSpecs,
    skip_key: Option<&str>,
) -> Vec<&'a Record> {
    let plan = active_filters(active, specs, skip_key);

    records
        .iter()
        .map(as_record)
        .filter(|record| plan.iter().all(|(spec, value)| matches_filter(record, spec, value)))
        .collect()
}

fn as_record<R: Borrow<Record>>(record: &R) -> &Record {
    <R as Borrow<Record>>::borrow(record)
}

/// Pairs each active value with its declaration, skipping unset values and
/// keys no filter declares.
fn active_filters<'s>(
    active: &'s ActiveFilterSet,
    specs: &'s FilterSpecs,
    skip_key: Option<&str>,
) -> Vec<(&'s FilterSpec, &'s FilterValue)> {
    let mut plan = Vec::with_capacity(active.len());

    for (key, value) in active.iter() {
        if skip_key == Some(key) {
            continue;
        }
        let spec = match specs.get(key) {
            Some(spec) => spec,
            None => {
                log::debug!(target: "filter", "ignoring value for undeclared filter {}", key);
                continue;
            }
        };
        if value.is_active_for(spec) {
            plan.push((spec, value));
        }
    }

    plan
}

/// Checks one record against one filter value.
/// Values whose shape does not fit the filter's type never exclude anything.
pub fn matches_filter(record: &Record, spec: &FilterSpec, value: &FilterValue) -> bool {
    let field_value = extract(record, &spec.field);

    match (&spec.kind, value) {
        (FilterKind::DateRange { strict }, FilterValue::Dates(dates)) => {
            date_in_range(field_value, dates.start_date, dates.end_date, *strict)
        }
        (FilterKind::MultiSelect { delimiter, match_mode }, FilterValue::Values(selected)) => {
            multi_select_match(field_value, selected, delimiter.as_deref(), *match_mode)
        }
        (FilterKind::SingleSelect { .. }, FilterValue::Value(selected)) => field_value
            .map(|v| v.display_value().trim() == selected.trim())
            .unwrap_or(false),
        (FilterKind::NumericRange, FilterValue::Range(range)) => numeric_range(field_value, range.min, range.max),
        (FilterKind::TextSearch { fields, case_sensitive }, FilterValue::Value(term)) => {
            let fields = if fields.is_empty() {
                std::slice::from_ref(&spec.field)
            } else {
                fields.as_slice()
            };
            text_search_match(record, fields, term, *case_sensitive)
        }
        _ => true,
    }
}

/// Reports values for undeclared keys and values of the wrong shape.
/// Neither is an error: both are ignored when filtering.
pub fn check_active_set(active: &ActiveFilterSet, specs: &FilterSpecs, sink: &mut dyn DiagnosticSink) {
    for (key, value) in active.iter() {
        match specs.get(key) {
            None => sink.report(Diagnostic::info(
                DiagnosticCode::UnknownFilterKey,
                key,
                "value supplied for a filter the view does not declare",
            )),
            Some(spec) if !value.fits(spec) => sink.report(Diagnostic::info(
                DiagnosticCode::MismatchedFilterValue,
                key,
                "value shape does not match the filter type",
            )),
            Some(_) => {}
        }
    }
}
