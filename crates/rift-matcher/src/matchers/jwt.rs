//! JWT matchers. Tokens are decoded, never verified.

use super::json::{contains_somewhere, expected_document};
use super::json_path::query_document;
use crate::models::MatcherValue;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

/// Decode a compact `header.payload.signature` token into
/// `{"header": ..., "payload": ...}`.
fn decode_token(token: &str) -> Option<Value> {
    let token = token.trim();
    let token = token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("bearer "))
        .unwrap_or(token);

    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        debug!("JWT does not have three segments");
        return None;
    };

    Some(json!({
        "header": decode_segment(header)?,
        "payload": decode_segment(payload)?,
    }))
}

fn decode_segment(segment: &str) -> Option<Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| debug!("Invalid base64 in JWT segment: {}", e))
        .ok()?;
    serde_json::from_slice(&bytes)
        .map_err(|e| debug!("Invalid JSON in JWT segment: {}", e))
        .ok()
}

/// Partial JSON match against the decoded token.
pub(super) fn jwt_match(value: &MatcherValue, candidate: &str) -> bool {
    match (expected_document(value), decode_token(candidate)) {
        (Some(fragment), Some(document)) => contains_somewhere(&document, &fragment),
        _ => false,
    }
}

/// JSONPath query against the decoded token; unprefixed paths address the payload.
pub(super) fn jwt_json_path_match(value: &MatcherValue, candidate: &str) -> Option<String> {
    let query = value.as_str()?;
    let document = decode_token(candidate)?;
    query_document(&qualify_path(query), &document)
}

fn qualify_path(query: &str) -> String {
    let trimmed = query.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|q| q.strip_suffix('}'))
        .unwrap_or(trimmed)
        .trim();

    if ["$.payload", "$.header"].iter().any(|root| addresses_root(inner, root)) {
        return inner.to_string();
    }
    let rest = inner.strip_prefix('$').unwrap_or(inner);
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    if rest.starts_with('[') {
        format!("$.payload{rest}")
    } else {
        format!("$.payload.{rest}")
    }
}

/// `query` is `root` itself or a path below it.
fn addresses_root(query: &str, root: &str) -> bool {
    query
        .strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}
