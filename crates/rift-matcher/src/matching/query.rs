//! Query matching: per-key matchers plus the deprecated whole-query-string field.

use super::field::{CompiledFieldMatchers, FieldMatch};
use super::headers::CompiledKeyedMatchers;
use crate::models::RequestDetails;

/// Per-key query match. Keys are compared lower-cased.
pub fn query_match(matchers: &CompiledKeyedMatchers, request: &RequestDetails) -> FieldMatch {
    matchers.evaluate(&request.query)
}

/// Match against the canonical (sorted, encoded) query string.
pub fn deprecated_query_match(
    matchers: &CompiledFieldMatchers,
    request: &RequestDetails,
) -> FieldMatch {
    if matchers.is_empty() {
        return FieldMatch::vacuous();
    }
    matchers.evaluate(&request.query_string())
}
