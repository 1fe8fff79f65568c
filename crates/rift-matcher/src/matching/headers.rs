//! Header matching.
//!
//! Header names are case-insensitive on both sides. Multiple values of one
//! header are joined with `;` before matching.

use super::field::{CompiledFieldMatchers, FieldMatch};
use crate::error::MatchingError;
use crate::matchers::MatcherRegistry;
use crate::models::{KeyedMatchers, MultiMap};
use std::collections::BTreeMap;
use tracing::trace;

/// Per-key matcher lists with lower-cased keys.
#[derive(Debug, Clone, Default)]
pub struct CompiledKeyedMatchers(Vec<(String, CompiledFieldMatchers)>);

impl CompiledKeyedMatchers {
    pub fn compile(
        keyed: &KeyedMatchers,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        keyed
            .iter()
            .map(|(key, rules)| {
                Ok((
                    key.to_lowercase(),
                    CompiledFieldMatchers::compile(rules, registry)?,
                ))
            })
            .collect::<Result<Vec<_>, MatchingError>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scored match. Every declared key must be present and match; scores
    /// accumulate across keys even when one fails.
    pub fn evaluate(&self, candidate: &MultiMap) -> FieldMatch {
        let candidate = lowercase_keys(candidate);
        let mut result = FieldMatch::vacuous();

        for (key, matchers) in &self.0 {
            match candidate.get(key.as_str()) {
                Some(values) => {
                    let field = matchers.evaluate(&values.join(";"));
                    result = result.and(field);
                }
                None => {
                    trace!("Request is missing key {}", key);
                    result.matched = false;
                }
            }
        }
        result
    }

    /// Unscored match. A key also matches when any single value satisfies
    /// every matcher on its own.
    pub fn matches(&self, candidate: &MultiMap) -> bool {
        let candidate = lowercase_keys(candidate);
        self.0.iter().all(|(key, matchers)| {
            candidate.get(key.as_str()).is_some_and(|values| {
                matchers.evaluate(&values.join(";")).matched
                    || values.iter().any(|value| matchers.evaluate(value).matched)
            })
        })
    }
}

fn lowercase_keys(candidate: &MultiMap) -> BTreeMap<String, Vec<&str>> {
    let mut lowered: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (key, values) in candidate {
        lowered
            .entry(key.to_lowercase())
            .or_default()
            .extend(values.iter().map(String::as_str));
    }
    lowered
}

/// Scored header match.
pub fn header_match(matchers: &CompiledKeyedMatchers, headers: &MultiMap) -> FieldMatch {
    matchers.evaluate(headers)
}
