//! FILENAME: tests/common/mod.rs
//! Fixtures for filter-engine integration tests.

#![allow(dead_code)]

use filter_engine::{FilterSpec, FilterSpecs, MatchMode};
use records::{FieldPath, Record};

pub fn path(p: &str) -> FieldPath {
    FieldPath::parse(p).expect("fixture paths are valid")
}

/// A small movie log: title, genre list, cast list, rating, watch date and a
/// nested `meta.language` field.
pub struct MovieFixture;

impl MovieFixture {
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, &'static str, &'static str)> {
        vec![
            ("Heat", "Crime, Drama", "Al Pacino, Robert De Niro", 8.3, "2023-01-14", "en"),
            ("Amelie", "Comedy, Romance", "Audrey Tautou", 8.3, "2023-02-03", "fr"),
            ("The Irishman", "Crime, Drama", "Robert De Niro, Al Pacino, Joe Pesci", 7.8, "2023-03-21", "en"),
            ("Spirited Away", "Animation, Fantasy", "Rumi Hiiragi", 8.6, "2023-03-30", "ja"),
            ("Casino", "Crime, Drama", "Robert De Niro, Sharon Stone, Joe Pesci", 8.2, "2023-05-02", "en"),
            ("Paprika", "Animation, Sci-Fi", "Unknown", 7.7, "1970-01-01", "ja"),
            ("Untitled", "", "", 0.0, "", "Unknown"),
        ]
    }

    pub fn records() -> Vec<Record> {
        Self::data()
            .into_iter()
            .map(|(title, genre, cast, rating, watched, language)| {
                Record::new()
                    .with("title", title)
                    .with("genre", genre)
                    .with("cast", cast)
                    .with("rating", rating)
                    .with("watched", watched)
                    .with("meta", Record::new().with("language", language))
            })
            .collect()
    }

    pub fn specs() -> FilterSpecs {
        FilterSpecs::new(vec![
            FilterSpec::delimited("genre", path("genre"), ",", MatchMode::Any),
            FilterSpec::delimited("cast", path("cast"), ",", MatchMode::All),
            FilterSpec::single_select("language", path("meta.language")),
            FilterSpec::date_range("watched", path("watched")),
            FilterSpec::numeric_range("rating", path("rating")),
            FilterSpec::text_search("search", path("title"), vec![path("title"), path("cast")]),
        ])
        .expect("fixture keys are unique")
    }
}

pub fn titles(records: &[&Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("title").map(|v| v.display_value()).unwrap_or_default())
        .collect()
}
