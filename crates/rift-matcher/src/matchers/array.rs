//! Array family matchers. The candidate is a `;`-separated list.

use crate::models::{MatcherConfig, MatcherValue};
use std::collections::{HashMap, HashSet};

pub const IGNORE_UNKNOWN: &str = "ignoreUnknown";
pub const IGNORE_ORDER: &str = "ignoreOrder";
pub const IGNORE_OCCURRENCES: &str = "ignoreOccurrences";

fn split_candidate(candidate: &str) -> Vec<&str> {
    if candidate.is_empty() {
        Vec::new()
    } else {
        candidate.split(';').collect()
    }
}

/// Configurable comparison. With no flags set the candidate must contain only
/// known values, each as often as expected, in the expected order.
pub(super) fn array_match(value: &MatcherValue, candidate: &str, config: &MatcherConfig) -> bool {
    let Some(expected) = value.as_string_list() else {
        return false;
    };
    let actual = split_candidate(candidate);

    let ignore_unknown = config.get_bool(IGNORE_UNKNOWN, false);
    let ignore_order = config.get_bool(IGNORE_ORDER, false);
    let ignore_occurrences = config.get_bool(IGNORE_OCCURRENCES, false);

    (ignore_unknown || has_all_known(&expected, &actual))
        && (ignore_occurrences || has_same_occurrences(&expected, &actual))
        && (ignore_order || is_in_same_order(&expected, &actual))
}

pub(super) fn contains_exactly_match(value: &MatcherValue, candidate: &str) -> bool {
    value
        .as_string_list()
        .is_some_and(|expected| expected.iter().map(String::as_str).eq(split_candidate(candidate)))
}

/// Every expected value appears in the candidate.
pub(super) fn contains_match(value: &MatcherValue, candidate: &str) -> bool {
    let Some(expected) = value.as_string_list() else {
        return false;
    };
    let actual: HashSet<&str> = split_candidate(candidate).into_iter().collect();
    expected.iter().all(|v| actual.contains(v.as_str()))
}

/// Every candidate value is one of the expected values.
pub(super) fn contains_only_match(value: &MatcherValue, candidate: &str) -> bool {
    let Some(expected) = value.as_string_list() else {
        return false;
    };
    has_all_known(&expected, &split_candidate(candidate))
}

fn has_all_known(expected: &[String], actual: &[&str]) -> bool {
    let known: HashSet<&str> = expected.iter().map(String::as_str).collect();
    actual.iter().all(|v| known.contains(v))
}

fn has_same_occurrences(expected: &[String], actual: &[&str]) -> bool {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in actual {
        *counts.entry(*v).or_default() += 1;
    }
    let mut wanted: HashMap<&str, usize> = HashMap::new();
    for v in expected {
        *wanted.entry(v.as_str()).or_default() += 1;
    }
    wanted
        .iter()
        .all(|(v, n)| counts.get(v).copied().unwrap_or(0) == *n)
}

/// Expected values appear in the candidate as an ordered subsequence.
fn is_in_same_order(expected: &[String], actual: &[&str]) -> bool {
    let mut idx = 0;
    for v in actual {
        if idx == expected.len() {
            break;
        }
        if *v == expected[idx] {
            idx += 1;
        }
    }
    idx == expected.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MatcherValue {
        vec!["q1", "q2", "q3"].into()
    }

    fn config(unknown: bool, order: bool, occurrences: bool) -> MatcherConfig {
        MatcherConfig::new()
            .with(IGNORE_UNKNOWN, unknown)
            .with(IGNORE_ORDER, order)
            .with(IGNORE_OCCURRENCES, occurrences)
    }

    #[test]
    fn test_array_default_config_requires_identical_list() {
        let cfg = MatcherConfig::default();
        assert!(array_match(&fixture(), "q1;q2;q3", &cfg));
        assert!(!array_match(&fixture(), "q1;q3;q2", &cfg));
        assert!(!array_match(&fixture(), "q1;q2;q3;q4", &cfg));
        assert!(!array_match(&fixture(), "q1;q2;q3;q3", &cfg));
        assert!(!array_match(&fixture(), "q1;q2", &cfg));
    }

    #[test]
    fn test_array_each_flag_relaxes_one_constraint() {
        let unknown = "q1;q4;q2;q3";
        let reordered = "q3;q2;q1";
        let repeated = "q1;q2;q2;q3";

        for (u, o, c) in [
            (false, false, false),
            (true, false, false),
            (false, true, false),
            (false, false, true),
            (true, true, false),
            (true, false, true),
            (false, true, true),
            (true, true, true),
        ] {
            let cfg = config(u, o, c);
            assert!(array_match(&fixture(), "q1;q2;q3", &cfg));
            assert_eq!(array_match(&fixture(), unknown, &cfg), u, "unknown {u} {o} {c}");
            assert_eq!(array_match(&fixture(), reordered, &cfg), o, "order {u} {o} {c}");
            assert_eq!(array_match(&fixture(), repeated, &cfg), c, "occur {u} {o} {c}");
        }
    }

    #[test]
    fn test_array_individual_checks() {
        assert!(array_match(&fixture(), "q1;q3;q2;q1;q3", &config(false, true, true)));
        assert!(!array_match(&fixture(), "q1;q4;q3;q2", &config(false, true, true)));
        assert!(array_match(&fixture(), "q1;q2;q3;q2;q4", &config(true, false, true)));
        assert!(!array_match(&fixture(), "q1;q3;q3;q2;q4", &config(true, false, true)));
        assert!(array_match(&fixture(), "q1;q3;q0;q2;q4", &config(true, true, false)));
        assert!(!array_match(&fixture(), "q1;q3;q3;q2;q4", &config(true, true, false)));
    }

    #[test]
    fn test_array_wrong_value_type() {
        assert!(!array_match(
            &MatcherValue::Json(serde_json::json!({"a": 1})),
            "a",
            &MatcherConfig::default()
        ));
    }

    #[test]
    fn test_contains_exactly() {
        assert!(contains_exactly_match(&fixture(), "q1;q2;q3"));
        assert!(!contains_exactly_match(&fixture(), "q1;q3;q2"));
        assert!(!contains_exactly_match(&fixture(), "q1;q2"));
    }

    #[test]
    fn test_contains() {
        assert!(contains_match(&fixture(), "q0;q3;q2;q1"));
        assert!(!contains_match(&fixture(), "q1;q2"));
    }

    #[test]
    fn test_contains_only() {
        assert!(contains_only_match(&fixture(), "q1;q1;q3"));
        assert!(contains_only_match(&fixture(), ""));
        assert!(!contains_only_match(&fixture(), "q1;q4"));
    }
}
