//! Field matching: AND over a list of compiled matchers with scoring.

use crate::error::MatchingError;
use crate::matchers::{MatcherKind, MatcherRegistry, ValueMatcher};
use crate::models::{MatcherValue, RequestFieldMatcher};
use std::fmt;
use tracing::trace;

/// Outcome of matching one request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMatch {
    pub matched: bool,
    /// Sum of the scores of the matchers that succeeded
    pub score: u32,
}

impl FieldMatch {
    pub fn new(matched: bool, score: u32) -> Self {
        Self { matched, score }
    }

    /// Result for a field with nothing to check.
    pub fn vacuous() -> Self {
        Self::new(true, 0)
    }

    /// AND two results, summing scores.
    pub fn and(self, other: FieldMatch) -> Self {
        Self::new(self.matched && other.matched, self.score + other.score)
    }
}

impl Default for FieldMatch {
    fn default() -> Self {
        Self::vacuous()
    }
}

/// Request fields, in the names used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchField {
    Body,
    Destination,
    Scheme,
    Path,
    DeprecatedQuery,
    Method,
    Headers,
    Query,
    State,
}

impl MatchField {
    pub fn name(self) -> &'static str {
        match self {
            MatchField::Body => "body",
            MatchField::Destination => "destination",
            MatchField::Scheme => "scheme",
            MatchField::Path => "path",
            MatchField::DeprecatedQuery => "deprecatedQuery",
            MatchField::Method => "method",
            MatchField::Headers => "headers",
            MatchField::Query => "query",
            MatchField::State => "state",
        }
    }
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Form field name and the matchers applied to its first value.
pub(crate) type CompiledForm = Vec<(String, CompiledFieldMatchers)>;

/// One compiled rule, optionally chained.
#[derive(Debug, Clone)]
pub struct CompiledFieldMatcher {
    matcher: ValueMatcher,
    /// Nested matchers of a `form` rule; `None` if the value was not a form map
    form: Option<CompiledForm>,
    do_match: Option<Box<CompiledFieldMatcher>>,
}

impl CompiledFieldMatcher {
    /// Compile a rule, rejecting kinds the registry does not know.
    pub fn compile(
        rule: &RequestFieldMatcher,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        let kind = registry
            .lookup(&rule.matcher)
            .ok_or_else(|| MatchingError::UnknownMatcher(rule.matcher.clone()))?;
        Self::compile_as(kind, rule, registry)
    }

    /// Compile a rule, treating unknown kinds as exact.
    pub fn compile_lenient(
        rule: &RequestFieldMatcher,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        let kind = registry.lookup_or_exact(&rule.matcher);
        Self::compile_as(kind, rule, registry)
    }

    fn compile_as(
        kind: MatcherKind,
        rule: &RequestFieldMatcher,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        let form = match (&rule.value, kind) {
            (MatcherValue::Form(fields), MatcherKind::Form) => Some(
                fields
                    .iter()
                    .map(|(name, rules)| {
                        Ok((name.clone(), CompiledFieldMatchers::compile(rules, registry)?))
                    })
                    .collect::<Result<CompiledForm, MatchingError>>()?,
            ),
            _ => None,
        };

        let do_match = rule
            .do_match
            .as_deref()
            .map(|next| CompiledFieldMatcher::compile(next, registry).map(Box::new))
            .transpose()?;

        Ok(Self {
            matcher: ValueMatcher::compile(kind, rule.value.clone(), rule.config.clone()),
            form,
            do_match,
        })
    }

    pub fn kind(&self) -> MatcherKind {
        self.matcher.kind()
    }

    pub(crate) fn form(&self) -> Option<&CompiledForm> {
        self.form.as_ref()
    }

    /// Score of a successful match (including chained matchers), `None` on failure.
    pub fn evaluate(&self, candidate: &str) -> Option<u32> {
        let extracted = self.matcher.matches(candidate)?;
        let mut score = self.kind().score();
        if let Some(next) = &self.do_match {
            score += next.evaluate(&extracted)?;
        }
        Some(score)
    }
}

/// AND-composed list of rules for one field. Empty means "always matches".
#[derive(Debug, Clone, Default)]
pub struct CompiledFieldMatchers(Vec<CompiledFieldMatcher>);

impl CompiledFieldMatchers {
    pub fn compile(
        rules: &[RequestFieldMatcher],
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        rules
            .iter()
            .map(|rule| CompiledFieldMatcher::compile(rule, registry))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn compile_lenient(
        rules: &[RequestFieldMatcher],
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        rules
            .iter()
            .map(|rule| CompiledFieldMatcher::compile_lenient(rule, registry))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledFieldMatcher> {
        self.0.iter()
    }

    /// Apply every rule. Scores of successful rules accumulate even when another
    /// rule fails, so partial matches can be ranked.
    pub fn evaluate(&self, candidate: &str) -> FieldMatch {
        let mut result = FieldMatch::vacuous();
        for matcher in &self.0 {
            match matcher.evaluate(candidate) {
                Some(score) => result.score += score,
                None => {
                    trace!("Matcher {} did not match", matcher.kind());
                    result.matched = false;
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatcherConfig;
    use proptest::prelude::*;

    fn compile(rules: &[RequestFieldMatcher]) -> CompiledFieldMatchers {
        CompiledFieldMatchers::compile(rules, &MatcherRegistry::standard()).unwrap()
    }

    #[test]
    fn test_empty_list_is_vacuous() {
        let matchers = compile(&[]);
        assert_eq!(matchers.evaluate("anything"), FieldMatch::new(true, 0));
    }

    #[test]
    fn test_scores() {
        let exact = compile(&[RequestFieldMatcher::new("exact", "GET")]);
        assert_eq!(exact.evaluate("GET"), FieldMatch::new(true, 2));

        let glob = compile(&[RequestFieldMatcher::new("glob", "G*")]);
        assert_eq!(glob.evaluate("GET"), FieldMatch::new(true, 1));

        let both = compile(&[
            RequestFieldMatcher::new("exact", "GET"),
            RequestFieldMatcher::new("regex", "^G"),
        ]);
        assert_eq!(both.evaluate("GET"), FieldMatch::new(true, 3));
    }

    #[test]
    fn test_and_semantics_keeps_partial_score() {
        let matchers = compile(&[
            RequestFieldMatcher::new("exact", "GET"),
            RequestFieldMatcher::new("glob", "P*"),
        ]);
        assert_eq!(matchers.evaluate("GET"), FieldMatch::new(false, 2));
    }

    #[test]
    fn test_kind_lookup_is_case_insensitive() {
        let matchers = compile(&[RequestFieldMatcher::new("ExAcT", "GET")]);
        assert!(matchers.evaluate("GET").matched);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = CompiledFieldMatchers::compile(
            &[RequestFieldMatcher::new("telepathy", "x")],
            &MatcherRegistry::standard(),
        )
        .unwrap_err();
        assert!(matches!(err, MatchingError::UnknownMatcher(name) if name == "telepathy"));
    }

    #[test]
    fn test_unknown_kind_lenient_falls_back_to_exact() {
        let matchers = CompiledFieldMatchers::compile_lenient(
            &[RequestFieldMatcher::new("telepathy", "a=b")],
            &MatcherRegistry::standard(),
        )
        .unwrap();
        assert_eq!(matchers.evaluate("a=b"), FieldMatch::new(true, 2));
    }

    #[test]
    fn test_do_match_applies_to_extracted_value() {
        let rule = RequestFieldMatcher::new("jsonpath", "$.user.id")
            .then(RequestFieldMatcher::new("exact", "42"));
        let matchers = compile(&[rule]);

        assert_eq!(
            matchers.evaluate(r#"{"user": {"id": "42"}}"#),
            FieldMatch::new(true, 3)
        );
        assert!(!matchers.evaluate(r#"{"user": {"id": "7"}}"#).matched);
    }

    #[test]
    fn test_do_match_chain_of_three() {
        let rule = RequestFieldMatcher::new("jsonpath", "$.token").then(
            RequestFieldMatcher::new("jwtjsonpath", "$.sub")
                .then(RequestFieldMatcher::new("glob", "user-*")),
        );
        let matchers = compile(&[rule]);

        let token = {
            use base64::engine::general_purpose::URL_SAFE_NO_PAD;
            use base64::Engine;
            format!(
                "{}.{}.sig",
                URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
                URL_SAFE_NO_PAD.encode(r#"{"sub":"user-1"}"#)
            )
        };
        let body = format!(r#"{{"token": "{token}"}}"#);
        assert_eq!(matchers.evaluate(&body), FieldMatch::new(true, 3));
    }

    #[test]
    fn test_array_config_routed() {
        let rule = RequestFieldMatcher::new("array", vec!["a", "b"])
            .with_config(MatcherConfig::new().with("ignoreOrder", true));
        let matchers = compile(&[rule]);
        assert!(matchers.evaluate("b;a").matched);
    }

    proptest! {
        #[test]
        fn empty_matchers_always_match(candidate in ".*") {
            prop_assert_eq!(compile(&[]).evaluate(&candidate), FieldMatch::new(true, 0));
        }
    }
}
