//! Body matching, with form decomposition for `form` rules.

use super::field::{CompiledFieldMatchers, FieldMatch};
use crate::matchers::MatcherKind;
use crate::models::RequestDetails;
use tracing::trace;

/// Match the request body.
///
/// `form` rules are evaluated against the decoded form fields (first value of
/// each named field; a missing field fails). Every other rule is evaluated
/// against the raw body. All rules are ANDed.
pub fn body_match(matchers: &CompiledFieldMatchers, request: &RequestDetails) -> FieldMatch {
    if !matchers.iter().any(|m| m.kind() == MatcherKind::Form) {
        return matchers.evaluate(&request.body);
    }

    let form = request.form_values();
    let mut result = FieldMatch::vacuous();

    for matcher in matchers.iter() {
        if matcher.kind() != MatcherKind::Form {
            match matcher.evaluate(&request.body) {
                Some(score) => result.score += score,
                None => result.matched = false,
            }
            continue;
        }

        let Some(fields) = matcher.form() else {
            trace!("Form matcher value is not a field map");
            result.matched = false;
            continue;
        };

        for (name, field_matchers) in fields {
            match form.get(name).and_then(|values| values.first()) {
                Some(value) => result = result.and(field_matchers.evaluate(value)),
                None => {
                    trace!("Form field {} missing from request", name);
                    result.matched = false;
                }
            }
        }
    }
    result
}
