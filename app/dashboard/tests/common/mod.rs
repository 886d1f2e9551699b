//! FILENAME: tests/common/mod.rs
//! Fixtures for dashboard integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use dashboard_lib::{load_view, Dashboard, ViewSnapshot};
use filter_engine::{FilterOptions, OptionList};
use metric_engine::MetricValue;
use records::Record;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// The spending view over a small bank export (checking and credit accounts,
/// January to April 2024, nothing in March).
pub struct SpendingFixture;

impl SpendingFixture {
    pub fn records() -> Vec<Record> {
        let json = std::fs::read_to_string(fixture_path("transactions.json")).expect("fixture readable");
        serde_json::from_str(&json).expect("fixture rows are valid records")
    }

    pub fn dashboard() -> Dashboard {
        let view = load_view(fixture_path("spending_view.json")).expect("fixture view is valid");
        Dashboard::new(view).expect("fixture view validates")
    }
}

pub fn kpi<'a>(snapshot: &'a ViewSnapshot, id: &str) -> &'a MetricValue {
    &snapshot
        .kpis
        .iter()
        .find(|k| k.id == id)
        .unwrap_or_else(|| panic!("no kpi {id}"))
        .value
}

pub fn number(value: &MetricValue) -> f64 {
    value.as_number().expect("numeric metric")
}

pub fn options<'a>(snapshot: &'a ViewSnapshot, key: &str) -> &'a FilterOptions {
    snapshot
        .filter_options
        .iter()
        .find(|o| o.key == key)
        .unwrap_or_else(|| panic!("no options for {key}"))
}

pub fn values(list: &[&str]) -> OptionList {
    OptionList::Values {
        values: list.iter().map(|s| s.to_string()).collect(),
    }
}
