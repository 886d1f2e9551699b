//! FILENAME: tests/common/mod.rs
//! Fixtures for metric-engine integration tests.

#![allow(dead_code)]

use metric_engine::MetricValue;
use records::{FieldPath, Record};

pub fn path(p: &str) -> FieldPath {
    FieldPath::parse(p).expect("fixture paths are valid")
}

/// Bank export: date, transaction type, category, amount.
pub struct FinanceFixture;

impl FinanceFixture {
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64)> {
        vec![
            ("2024-01-03", "expense", "Groceries", 54.20),
            ("2024-01-09", "expense", "Rent", 950.00),
            ("2024-01-15", "income", "Salary", 3200.00),
            ("2024-01-21", "expense", "Groceries", 61.80),
            ("2024-02-02", "expense", "Transport", 45.00),
            ("2024-02-15", "income", "Salary", 3200.00),
            ("2024-02-18", "expense", "Groceries", 48.50),
            ("2024-04-04", "expense", "Rent", 950.00),
            ("2024-04-15", "income", "Salary", 3300.00),
        ]
    }

    pub fn records() -> Vec<Record> {
        Self::data()
            .into_iter()
            .map(|(date, kind, category, amount)| {
                Record::new()
                    .with("date", date)
                    .with("transaction_type", kind)
                    .with("category", category)
                    .with("movement", amount)
            })
            .collect()
    }
}

/// Daily health export: date, steps, sleep seconds, resting heart rate.
/// Zero readings mean the watch was not worn.
pub struct HealthFixture;

impl HealthFixture {
    pub fn data() -> Vec<(&'static str, f64, f64, f64)> {
        vec![
            ("2024-03-04", 8200.0, 25200.0, 58.0),
            ("2024-03-05", 10400.0, 27000.0, 57.0),
            ("2024-03-06", 0.0, 0.0, 0.0),
            ("2024-03-07", 6100.0, 23400.0, 61.0),
            ("2024-03-11", 12000.0, 28800.0, 56.0),
            ("1970-01-01", 500.0, 3600.0, 70.0),
        ]
    }

    pub fn records() -> Vec<Record> {
        Self::data()
            .into_iter()
            .map(|(date, steps, sleep, hr)| {
                Record::new()
                    .with("date", date)
                    .with("steps", steps)
                    .with("sleep_seconds", sleep)
                    .with("resting_hr", hr)
            })
            .collect()
    }
}

/// Watch history with multi-valued cast and genre fields.
pub struct MovieFixture;

impl MovieFixture {
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64)> {
        vec![
            ("Heat", "Al Pacino, Robert De Niro, Val Kilmer", "Crime", 170.0),
            ("The Irishman", "Robert De Niro, Al Pacino, Joe Pesci", "Crime", 209.0),
            ("Casino", "Robert De Niro, Sharon Stone, Joe Pesci", "Crime", 178.0),
            ("Top Gun", "Tom Cruise, Val Kilmer", "Action", 110.0),
            ("Scarface", "Al Pacino", "Crime", 170.0),
            ("Untitled", "Unknown", "", 90.0),
        ]
    }

    pub fn records() -> Vec<Record> {
        Self::data()
            .into_iter()
            .map(|(title, cast, genre, minutes)| {
                Record::new()
                    .with("title", title)
                    .with("cast", cast)
                    .with("genre", genre)
                    .with("runtime", minutes)
            })
            .collect()
    }
}

pub fn number(value: &MetricValue) -> f64 {
    value.as_number().expect("numeric metric")
}
