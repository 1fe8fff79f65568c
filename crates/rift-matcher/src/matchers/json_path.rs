//! JSONPath matching (RFC 9535 via `serde_json_path`).

use crate::models::MatcherValue;
use serde_json::Value;
use serde_json_path::JsonPath;
use tracing::debug;

/// Normalize a query: drop the legacy `{...}` wrapper and ensure a `$` root.
fn prepare_query(query: &str) -> String {
    let trimmed = query.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|q| q.strip_suffix('}'))
        .unwrap_or(trimmed)
        .trim();

    if inner.starts_with('$') {
        inner.to_string()
    } else if inner.starts_with('.') || inner.starts_with('[') {
        format!("${inner}")
    } else {
        format!("$.{inner}")
    }
}

/// Evaluate a query against a JSON document, returning the extracted value.
///
/// A single string result is returned verbatim, anything else as JSON (several
/// results as a JSON array).
pub(super) fn query_document(query: &str, document: &Value) -> Option<String> {
    let prepared = prepare_query(query);
    let path = match JsonPath::parse(&prepared) {
        Ok(path) => path,
        Err(e) => {
            debug!("Failed to parse JSONPath query '{}': {}", prepared, e);
            return None;
        }
    };

    let nodes = path.query(document).all();
    let extracted = match nodes.as_slice() {
        [] => return None,
        [Value::String(s)] => s.clone(),
        [single] => single.to_string(),
        many => Value::Array(many.iter().map(|v| (*v).clone()).collect()).to_string(),
    };

    // A result echoing the query back is not a real match
    if extracted == query || extracted == prepared {
        return None;
    }
    Some(extracted)
}

/// Succeeds when the query resolves to at least one node.
pub fn json_path_match(value: &MatcherValue, candidate: &str) -> Option<String> {
    let query = value.as_str()?;
    let document: Value = match serde_json::from_str(candidate) {
        Ok(document) => document,
        Err(e) => {
            debug!("Failed to parse body as JSON for JSONPath: {}", e);
            return None;
        }
    };
    query_document(query, &document)
}
