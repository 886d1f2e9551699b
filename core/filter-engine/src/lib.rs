//! FILENAME: core/filter-engine/src/lib.rs
//! Declarative filtering for the dashboards.
//!
//! This crate narrows record collections by the user's current selection and
//! computes what each filter control may still offer. It depends on `records`
//! for the row model, the path extractor and date parsing.
//!
//! Layers:
//! - `definition`: Serializable configuration (which filters a view HAS)
//! - `predicates`: Pure per-value tests (date window, membership, comparisons)
//! - `apply`: AND-combination of the active filters over a collection
//! - `cascade`: Option lists that respond to the other filters
//! - `cache`: Caller-owned memo for the option lists

pub mod apply;
pub mod cache;
pub mod cascade;
pub mod definition;
pub mod error;
pub mod predicates;

pub use apply::{apply_filters, apply_filters_except, check_active_set, matches_filter};
pub use cache::{CacheStats, OptionsCache};
pub use cascade::{options_for, resolve_options, FilterOptions, OptionList};
pub use definition::*;
pub use error::FilterError;
pub use predicates::{
    comparison_op, date_in_range, multi_select_match, numeric_range, text_search_match, value_tokens,
    ComparisonOperator,
};
