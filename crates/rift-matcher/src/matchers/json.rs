//! JSON equality and partial (containment) matching.

use crate::models::MatcherValue;
use serde_json::Value;
use tracing::debug;

/// Parse the matcher value as a JSON document. String values hold JSON text,
/// structured values are used as-is.
pub(super) fn expected_document(value: &MatcherValue) -> Option<Value> {
    match value {
        MatcherValue::String(text) => serde_json::from_str(text)
            .map_err(|e| debug!("Matcher value is not valid JSON: {}", e))
            .ok(),
        MatcherValue::Json(Value::Null) => None,
        MatcherValue::Json(value) => Some(value.clone()),
        MatcherValue::StringList(_) | MatcherValue::Form(_) => None,
    }
}

fn parse_candidate(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate)
        .map_err(|e| debug!("Candidate is not valid JSON: {}", e))
        .ok()
}

/// Deep structural equality, insensitive to formatting and object key order.
pub fn json_match(value: &MatcherValue, candidate: &str) -> bool {
    match (expected_document(value), parse_candidate(candidate)) {
        (Some(expected), Some(actual)) => json_equals(&expected, &actual),
        _ => false,
    }
}

/// Succeeds when some node of the candidate document contains the fragment.
pub fn json_partial_match(value: &MatcherValue, candidate: &str) -> bool {
    match (expected_document(value), parse_candidate(candidate)) {
        (Some(fragment), Some(actual)) => contains_somewhere(&actual, &fragment),
        _ => false,
    }
}

fn json_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_equals(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| json_equals(l, r)))
        }
        _ => a == b,
    }
}

/// Walk the document and test containment at every node.
pub(super) fn contains_somewhere(node: &Value, fragment: &Value) -> bool {
    if contains(node, fragment) {
        return true;
    }
    match node {
        Value::Object(map) => map.values().any(|child| contains_somewhere(child, fragment)),
        Value::Array(items) => items.iter().any(|child| contains_somewhere(child, fragment)),
        _ => false,
    }
}

fn contains(actual: &Value, fragment: &Value) -> bool {
    match (actual, fragment) {
        (Value::Object(actual), Value::Object(fragment)) => fragment
            .iter()
            .all(|(key, want)| actual.get(key).is_some_and(|have| contains(have, want))),
        (Value::Array(actual), Value::Array(fragment)) => fragment
            .iter()
            .all(|want| actual.iter().any(|have| contains(have, want))),
        _ => json_equals(actual, fragment),
    }
}
