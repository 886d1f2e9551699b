//! FILENAME: tests/test_grouped.rs
//! Integration tests for ranked group metrics.

mod common;

use common::{number, path, FinanceFixture, MovieFixture};
use metric_engine::{
    group_metric, top_n, Aggregation, Condition, DimensionSpec, GroupResult, MetricSpec, SortDirection,
};
use records::{Diagnostic, Record};

fn keys(groups: &[GroupResult]) -> Vec<&str> {
    groups.iter().map(|g| g.key.as_str()).collect()
}

fn cast_dimension() -> DimensionSpec {
    DimensionSpec::new("cast", path("cast")).delimited(",")
}

// ============================================================================
// REFERENCE SCENARIOS
// ============================================================================

#[test]
fn test_delimiter_expansion_count() {
    let records = vec![Record::new().with("cast", "A, B, C")];
    let mut sink: Vec<Diagnostic> = Vec::new();

    let groups = group_metric(
        &records,
        &cast_dimension(),
        &MetricSpec::count("appearances"),
        SortDirection::Desc,
        &mut sink,
    );
    assert_eq!(groups.len(), 3);
    assert_eq!(keys(&groups), vec!["A", "B", "C"]);
    assert_eq!(groups.iter().map(|g| g.member_count).sum::<usize>(), 3);
}

#[test]
fn test_top_n_truncation_and_sort() {
    let records: Vec<Record> = [("a", 5.0), ("b", 1.0), ("c", 9.0), ("d", 3.0)]
        .iter()
        .map(|(k, v)| Record::new().with("k", *k).with("v", *v))
        .collect();
    let dimension = DimensionSpec::new("k", path("k"));
    let metric = MetricSpec::of("total", Aggregation::Sum, path("v"));
    let mut sink: Vec<Diagnostic> = Vec::new();

    let top = top_n(&records, &dimension, &metric, 2, SortDirection::default(), &mut sink);
    let values: Vec<f64> = top.iter().map(|g| number(&g.aggregated_value)).collect();
    assert_eq!(values, vec![9.0, 5.0]);
}

// ============================================================================
// RANKING
// ============================================================================

#[test]
fn test_cast_ranked_by_runtime() {
    let records = MovieFixture::records();
    let minutes = MetricSpec::of("minutes", Aggregation::Sum, path("runtime"));
    let mut sink: Vec<Diagnostic> = Vec::new();

    let top = top_n(&records, &cast_dimension(), &minutes, 3, SortDirection::Desc, &mut sink);
    assert_eq!(keys(&top), vec!["Robert De Niro", "Al Pacino", "Joe Pesci"]);
    assert_eq!(number(&top[0].aggregated_value), 557.0);
    assert_eq!(top[0].member_count, 3);
}

#[test]
fn test_ties_rank_in_first_encounter_order() {
    let records = MovieFixture::records();
    let mut sink: Vec<Diagnostic> = Vec::new();

    let groups = group_metric(
        &records,
        &cast_dimension(),
        &MetricSpec::count("films"),
        SortDirection::Desc,
        &mut sink,
    );
    assert_eq!(
        keys(&groups),
        vec!["Al Pacino", "Robert De Niro", "Val Kilmer", "Joe Pesci", "Sharon Stone", "Tom Cruise"]
    );
}

#[test]
fn test_unknown_and_blank_dimension_values_are_dropped() {
    let records = MovieFixture::records();
    let genre = DimensionSpec::new("genre", path("genre"));
    let mut sink: Vec<Diagnostic> = Vec::new();

    let groups = group_metric(&records, &genre, &MetricSpec::count("films"), SortDirection::Asc, &mut sink);
    assert_eq!(keys(&groups), vec!["Action", "Crime"]);

    let cast = group_metric(&records, &cast_dimension(), &MetricSpec::count("films"), SortDirection::Asc, &mut sink);
    assert!(cast.iter().all(|g| g.key != "Unknown"));
}

#[test]
fn test_metric_conditions_apply_per_row() {
    let records = MovieFixture::records();
    let crime_only = MetricSpec::count("crime")
        .with_condition(Condition::new(path("genre"), Default::default(), "Crime"));
    let mut sink: Vec<Diagnostic> = Vec::new();

    let groups = group_metric(&records, &cast_dimension(), &crime_only, SortDirection::Desc, &mut sink);
    let kilmer = groups.iter().find(|g| g.key == "Val Kilmer").unwrap();
    assert_eq!(number(&kilmer.aggregated_value), 1.0);
    assert!(groups.iter().all(|g| g.key != "Tom Cruise"));
}

#[test]
fn test_metric_data_override() {
    let expenses = MetricSpec::of("spend", Aggregation::Sum, path("movement"))
        .with_condition(Condition::new(path("transaction_type"), Default::default(), "expense"))
        .with_data(FinanceFixture::records());
    let category = DimensionSpec::new("category", path("category")).with_labels(vec![path("category")]);
    let mut sink: Vec<Diagnostic> = Vec::new();

    let no_records: Vec<Record> = Vec::new();
    let top = top_n(&no_records, &category, &expenses, 1, SortDirection::Desc, &mut sink);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].display_label, "Rent");
    assert_eq!(number(&top[0].aggregated_value), 1900.0);
}

#[test]
fn test_mode_per_group() {
    let records = FinanceFixture::records();
    let dimension = DimensionSpec::new("type", path("transaction_type"));
    let metric = MetricSpec::of("usual", Aggregation::Mode, path("category"));
    let mut sink: Vec<Diagnostic> = Vec::new();

    let groups = group_metric(&records, &dimension, &metric, SortDirection::Desc, &mut sink);
    let expense = groups.iter().find(|g| g.key == "expense").unwrap();
    assert_eq!(expense.aggregated_value.as_text(), Some("Groceries"));
}
