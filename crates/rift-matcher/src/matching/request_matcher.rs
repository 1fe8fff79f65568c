//! Compiled form of a request matcher.

use super::body::body_match;
use super::field::{CompiledFieldMatchers, FieldMatch, MatchField};
use super::headers::{header_match, CompiledKeyedMatchers};
use super::query::{deprecated_query_match, query_match};
use super::state_matcher::state_match;
use crate::error::MatchingError;
use crate::matchers::MatcherRegistry;
use crate::models::{RequestDetails, RequestMatcher, RequestMatcherResponsePair};
use crate::state::StateReader;
use std::collections::BTreeMap;

/// Field evaluation order used by the runner.
pub const FIELD_ORDER: [MatchField; 9] = [
    MatchField::Body,
    MatchField::Destination,
    MatchField::Scheme,
    MatchField::Path,
    MatchField::DeprecatedQuery,
    MatchField::Method,
    MatchField::Headers,
    MatchField::Query,
    MatchField::State,
];

#[derive(Debug, Clone, Default)]
pub struct CompiledRequestMatcher {
    body: CompiledFieldMatchers,
    destination: CompiledFieldMatchers,
    scheme: CompiledFieldMatchers,
    path: CompiledFieldMatchers,
    deprecated_query: CompiledFieldMatchers,
    method: CompiledFieldMatchers,
    headers: CompiledKeyedMatchers,
    query: CompiledKeyedMatchers,
    requires_state: BTreeMap<String, String>,
}

impl CompiledRequestMatcher {
    pub fn compile(
        matcher: &RequestMatcher,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        Ok(Self {
            body: CompiledFieldMatchers::compile(&matcher.body, registry)?,
            destination: CompiledFieldMatchers::compile(&matcher.destination, registry)?,
            scheme: CompiledFieldMatchers::compile(&matcher.scheme, registry)?,
            path: CompiledFieldMatchers::compile(&matcher.path, registry)?,
            deprecated_query: CompiledFieldMatchers::compile_lenient(
                &matcher.deprecated_query,
                registry,
            )?,
            method: CompiledFieldMatchers::compile(&matcher.method, registry)?,
            headers: CompiledKeyedMatchers::compile(&matcher.headers, registry)?,
            query: match &matcher.query {
                Some(query) => CompiledKeyedMatchers::compile(query, registry)?,
                None => CompiledKeyedMatchers::default(),
            },
            requires_state: matcher.requires_state.clone(),
        })
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn has_state(&self) -> bool {
        !self.requires_state.is_empty()
    }

    /// Evaluate one field against the request.
    pub fn evaluate_field(
        &self,
        field: MatchField,
        request: &RequestDetails,
        state: &dyn StateReader,
    ) -> FieldMatch {
        match field {
            MatchField::Body => body_match(&self.body, request),
            MatchField::Destination => self.destination.evaluate(&request.destination),
            MatchField::Scheme => self.scheme.evaluate(&request.scheme),
            MatchField::Path => self.path.evaluate(&request.path),
            MatchField::DeprecatedQuery => deprecated_query_match(&self.deprecated_query, request),
            MatchField::Method => self.method.evaluate(&request.method),
            MatchField::Headers => header_match(&self.headers, &request.headers),
            MatchField::Query => query_match(&self.query, request),
            MatchField::State => state_match(&self.requires_state, state),
        }
    }

    /// Unscored header check.
    pub fn headers_match(&self, request: &RequestDetails) -> bool {
        self.headers.matches(&request.headers)
    }
}

/// A pair as stored in a simulation: the authored form and its compiled matcher.
#[derive(Debug, Clone)]
pub struct CompiledPair {
    pub source: RequestMatcherResponsePair,
    pub matcher: CompiledRequestMatcher,
}

impl CompiledPair {
    pub fn compile(
        pair: RequestMatcherResponsePair,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        let matcher = CompiledRequestMatcher::compile(&pair.request_matcher, registry)?;
        Ok(Self {
            source: pair,
            matcher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestFieldMatcher, ResponseDetails};
    use crate::state::State;

    #[test]
    fn test_compile_rejects_unknown_kind() {
        let matcher = RequestMatcher {
            path: vec![RequestFieldMatcher::new("nope", "/")],
            ..Default::default()
        };
        let result = CompiledPair::compile(
            RequestMatcherResponsePair::new(matcher, ResponseDetails::default()),
            &MatcherRegistry::standard(),
        );
        assert!(matches!(result, Err(MatchingError::UnknownMatcher(_))));
    }

    #[test]
    fn test_deprecated_query_tolerates_unknown_kind() {
        let matcher = RequestMatcher {
            deprecated_query: vec![RequestFieldMatcher::new("legacy", "a=1")],
            ..Default::default()
        };
        assert!(CompiledRequestMatcher::compile(&matcher, &MatcherRegistry::standard()).is_ok());
    }

    #[test]
    fn test_evaluate_fields() {
        let matcher = RequestMatcher {
            method: vec![RequestFieldMatcher::new("exact", "GET")],
            scheme: vec![RequestFieldMatcher::new("exact", "https")],
            ..Default::default()
        };
        let compiled = CompiledRequestMatcher::compile(&matcher, &MatcherRegistry::standard())
            .unwrap();
        let request = RequestDetails {
            method: "GET".to_string(),
            scheme: "http".to_string(),
            ..Default::default()
        };
        let state = State::new();

        assert_eq!(
            compiled.evaluate_field(MatchField::Method, &request, &state),
            FieldMatch::new(true, 2)
        );
        assert!(!compiled
            .evaluate_field(MatchField::Scheme, &request, &state)
            .matched);
        assert_eq!(
            compiled.evaluate_field(MatchField::Path, &request, &state),
            FieldMatch::vacuous()
        );
    }
}
