use super::field::FieldMatch;
use crate::state::StateReader;
use std::collections::BTreeMap;

/// Every required key must hold exactly the expected value; +1 per satisfied key.
///
/// State is read per key at call time, so a concurrent write may be observed
/// half-way through.
pub fn state_match(required: &BTreeMap<String, String>, state: &dyn StateReader) -> FieldMatch {
    let mut result = FieldMatch::vacuous();
    for (key, expected) in required {
        if state.get(key).as_deref() == Some(expected.as_str()) {
            result.score += 1;
        } else {
            result.matched = false;
        }
    }
    result
}
