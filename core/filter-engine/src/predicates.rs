//! FILENAME: core/filter-engine/src/predicates.rs
//! PURPOSE: Stateless match functions behind every filter type.
//! CONTEXT: Each predicate takes the (possibly missing) field value and the
//! current selection and answers whether the record stays. Comparison
//! operators are shared with metric-level filter conditions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use records::{end_of_day, extract, is_set_date, parse_date, split_tokens, start_of_day, FieldPath, Record, Value};
use serde::{Deserialize, Serialize};

use crate::definition::MatchMode;
use crate::error::FilterError;

// ============================================================================
// COMPARISON OPERATORS
// ============================================================================

/// Operators accepted in metric filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[default]
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "==")]
    StrictEquals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "!==")]
    StrictNotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "=",
            ComparisonOperator::StrictEquals => "==",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::StrictNotEquals => "!==",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Equals | ComparisonOperator::StrictEquals => ordering == Ordering::Equal,
            ComparisonOperator::NotEquals | ComparisonOperator::StrictNotEquals => ordering != Ordering::Equal,
            ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
            ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
            ComparisonOperator::LessThan => ordering == Ordering::Less,
            ComparisonOperator::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }

    fn is_equality(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::Equals
                | ComparisonOperator::StrictEquals
                | ComparisonOperator::NotEquals
                | ComparisonOperator::StrictNotEquals
        )
    }
}

impl FromStr for ComparisonOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(ComparisonOperator::Equals),
            "==" => Ok(ComparisonOperator::StrictEquals),
            "!=" | "<>" => Ok(ComparisonOperator::NotEquals),
            "!==" => Ok(ComparisonOperator::StrictNotEquals),
            ">" => Ok(ComparisonOperator::GreaterThan),
            ">=" => Ok(ComparisonOperator::GreaterThanOrEqual),
            "<" => Ok(ComparisonOperator::LessThan),
            "<=" => Ok(ComparisonOperator::LessThanOrEqual),
            other => Err(FilterError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Compares a field value against a target.
///
/// Numbers are compared numerically when both sides coerce. Otherwise the
/// equality family falls back to string equality and the ordering operators
/// compare dates when both sides parse as dates (and fail if not).
/// A missing field compares as null.
pub fn comparison_op(value: Option<&Value>, operator: ComparisonOperator, target: &Value) -> bool {
    let value = value.unwrap_or(&Value::Null);

    if let (Some(a), Some(b)) = (value.as_number(), target.as_number()) {
        return a
            .partial_cmp(&b)
            .map(|ordering| operator.accepts(ordering))
            .unwrap_or(false);
    }

    if operator.is_equality() {
        let equal = value.display_value() == target.display_value();
        let ordering = if equal { Ordering::Equal } else { Ordering::Less };
        return operator.accepts(ordering);
    }

    match (parse_date(value), parse_date(target)) {
        (Some(a), Some(b)) => operator.accepts(a.cmp(&b)),
        _ => false,
    }
}

// ============================================================================
// FILTER PREDICATES
// ============================================================================

/// Date window check. `start` counts from local midnight, `end` through
/// 23:59:59.999. With `strict`, unparseable and epoch-default dates never match.
pub fn date_in_range(value: Option<&Value>, start: Option<NaiveDate>, end: Option<NaiveDate>, strict: bool) -> bool {
    let parsed = value
        .and_then(parse_date)
        .filter(|dt| !strict || is_set_date(dt));

    let dt = match parsed {
        Some(dt) => dt,
        None => return !strict && start.is_none() && end.is_none(),
    };

    if let Some(start) = start {
        if dt < start_of_day(start) {
            return false;
        }
    }
    if let Some(end) = end {
        if dt > end_of_day(end) {
            return false;
        }
    }
    true
}

/// Tokens of a field value for delimited matching. Only text is split;
/// any other value has no tokens.
pub fn value_tokens(value: &Value, delimiter: &str) -> Vec<String> {
    match value {
        Value::Text(text) => split_tokens(text, delimiter).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Multi-select check. An empty selection matches everything.
pub fn multi_select_match(
    value: Option<&Value>,
    selected: &[String],
    delimiter: Option<&str>,
    match_mode: MatchMode,
) -> bool {
    if selected.is_empty() {
        return true;
    }
    let value = match value {
        Some(v) => v,
        None => return false,
    };

    let is_selected = |candidate: &str| selected.iter().any(|s| s == candidate);

    match (delimiter, match_mode) {
        (None, _) | (Some(_), MatchMode::Exact) => is_selected(value.display_value().as_str()),
        (Some(delimiter), MatchMode::Any) => value_tokens(value, delimiter)
            .iter()
            .any(|token| is_selected(token.as_str())),
        (Some(delimiter), MatchMode::All) => {
            let tokens = value_tokens(value, delimiter);
            selected.iter().all(|s| tokens.iter().any(|t| t == s))
        }
    }
}

/// Numeric window check. Non-numeric values fail.
pub fn numeric_range(value: Option<&Value>, min: Option<f64>, max: Option<f64>) -> bool {
    let n = match value.and_then(Value::as_number) {
        Some(n) => n,
        None => return false,
    };
    min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
}

/// Substring search over several fields. A blank term matches everything.
pub fn text_search_match(record: &Record, fields: &[FieldPath], term: &str, case_sensitive: bool) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = if case_sensitive {
        term.to_string()
    } else {
        term.to_lowercase()
    };

    fields.iter().any(|field| {
        extract(record, field)
            .map(|value| {
                let haystack = value.display_value();
                if case_sensitive {
                    haystack.contains(&needle)
                } else {
                    haystack.to_lowercase().contains(&needle)
                }
            })
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn date_range_is_inclusive_of_whole_days() {
        let late = Value::from("2024-03-31T23:59:59");
        let early = Value::from("2024-03-01T00:00:00");
        let start = ymd(2024, 3, 1);
        let end = ymd(2024, 3, 31);
        assert!(date_in_range(Some(&late), start, end, true));
        assert!(date_in_range(Some(&early), start, end, true));
        assert!(!date_in_range(Some(&Value::from("2024-04-01")), start, end, true));
        assert!(!date_in_range(Some(&Value::from("2024-02-29")), start, end, true));
    }

    #[test]
    fn strict_dates_reject_placeholders() {
        let epoch = Value::from("1970-01-01");
        assert!(!date_in_range(Some(&epoch), None, None, true));
        assert!(!date_in_range(Some(&Value::from("garbage")), None, None, true));
        assert!(!date_in_range(None, None, None, true));
        assert!(date_in_range(Some(&Value::from("garbage")), None, None, false));
        assert!(!date_in_range(Some(&Value::from("garbage")), ymd(2024, 1, 1), None, false));
    }

    #[test]
    fn multi_select_without_delimiter_is_membership() {
        let selected = strings(&["Drama", "Crime"]);
        assert!(multi_select_match(Some(&Value::from("Drama")), &selected, None, MatchMode::Any));
        assert!(!multi_select_match(Some(&Value::from("Comedy")), &selected, None, MatchMode::Any));
        assert!(!multi_select_match(None, &selected, None, MatchMode::Any));
        assert!(multi_select_match(None, &[], None, MatchMode::Any));
    }

    #[test]
    fn delimited_match_modes() {
        let genres = Value::from("Drama, Crime, Thriller");
        let any = strings(&["Crime", "Comedy"]);
        let all = strings(&["Crime", "Drama"]);
        let exact = strings(&["Drama, Crime, Thriller"]);

        assert!(multi_select_match(Some(&genres), &any, Some(","), MatchMode::Any));
        assert!(!multi_select_match(Some(&genres), &any, Some(","), MatchMode::All));
        assert!(multi_select_match(Some(&genres), &all, Some(","), MatchMode::All));
        assert!(multi_select_match(Some(&genres), &exact, Some(","), MatchMode::Exact));
        assert!(!multi_select_match(Some(&genres), &all, Some(","), MatchMode::Exact));
    }

    #[test]
    fn only_text_is_split_into_tokens() {
        assert!(value_tokens(&Value::from(42.0), ",").is_empty());
        assert_eq!(value_tokens(&Value::from("A, A, B"), ","), strings(&["A", "A", "B"]));
        assert!(!multi_select_match(Some(&Value::from(42.0)), &strings(&["42"]), Some(","), MatchMode::Any));
        assert!(multi_select_match(Some(&Value::from(42.0)), &strings(&["42"]), None, MatchMode::Any));
    }

    #[test]
    fn numeric_range_coerces_text() {
        assert!(numeric_range(Some(&Value::from("7.5")), Some(7.0), Some(8.0)));
        assert!(!numeric_range(Some(&Value::from("n/a")), Some(7.0), None));
        assert!(!numeric_range(None, None, None));
        assert!(numeric_range(Some(&Value::from(10)), None, Some(10.0)));
    }

    #[test]
    fn comparison_prefers_numbers_then_strings() {
        use ComparisonOperator::*;
        assert!(comparison_op(Some(&Value::from("10")), Equals, &Value::from(10.0)));
        assert!(comparison_op(Some(&Value::from(12)), GreaterThan, &Value::from("9")));
        assert!(comparison_op(Some(&Value::from("expense")), StrictEquals, &Value::from("expense")));
        assert!(comparison_op(Some(&Value::from("income")), NotEquals, &Value::from("expense")));
        assert!(!comparison_op(Some(&Value::from("abc")), GreaterThan, &Value::from("abb")));
        assert!(comparison_op(None, NotEquals, &Value::from("expense")));
        assert!(comparison_op(
            Some(&Value::from("2024-05-02")),
            GreaterThanOrEqual,
            &Value::from("2024-05-01")
        ));
    }

    #[test]
    fn operators_parse_from_symbols() {
        assert_eq!("!==".parse::<ComparisonOperator>(), Ok(ComparisonOperator::StrictNotEquals));
        assert_eq!("<>".parse::<ComparisonOperator>(), Ok(ComparisonOperator::NotEquals));
        assert!("=~".parse::<ComparisonOperator>().is_err());
        let op: ComparisonOperator = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(op, ComparisonOperator::GreaterThanOrEqual);
    }

    #[test]
    fn text_search_is_case_insensitive_by_default() {
        let record = Record::new().with("title", "The Godfather").with("director", "Coppola");
        let fields = vec![FieldPath::parse("title").unwrap(), FieldPath::parse("director").unwrap()];
        assert!(text_search_match(&record, &fields, "godfather", false));
        assert!(text_search_match(&record, &fields, "COPP", false));
        assert!(!text_search_match(&record, &fields, "godfather", true));
        assert!(text_search_match(&record, &fields, "  ", true));
    }
}
