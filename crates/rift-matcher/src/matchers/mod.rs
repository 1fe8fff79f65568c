//! Value matchers.
//!
//! Each matcher decides whether a single candidate string satisfies a matcher
//! value. Matchers are total: malformed matcher values or candidates are a
//! non-match, never an error or a panic. On success a matcher yields the value
//! it extracted (the candidate itself for non-extracting kinds), which a chained
//! `doMatch` matcher is then applied to.

mod array;
mod json;
mod json_path;
mod jwt;
mod string;
mod xml;
mod xml_templated;

pub use json::{json_match, json_partial_match};
pub use json_path::json_path_match;
pub use xml::{xml_match, xpath_match};
pub use xml_templated::xml_templated_match;

use crate::models::{MatcherConfig, MatcherValue};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Closed set of matcher kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    Exact,
    Glob,
    Regex,
    Json,
    JsonPartial,
    JsonPath,
    Xpath,
    Xml,
    XmlTemplated,
    Array,
    ContainsExactly,
    Contains,
    ContainsOnly,
    Negate,
    Jwt,
    JwtJsonPath,
    Form,
}

impl MatcherKind {
    pub const ALL: [MatcherKind; 17] = [
        MatcherKind::Exact,
        MatcherKind::Glob,
        MatcherKind::Regex,
        MatcherKind::Json,
        MatcherKind::JsonPartial,
        MatcherKind::JsonPath,
        MatcherKind::Xpath,
        MatcherKind::Xml,
        MatcherKind::XmlTemplated,
        MatcherKind::Array,
        MatcherKind::ContainsExactly,
        MatcherKind::Contains,
        MatcherKind::ContainsOnly,
        MatcherKind::Negate,
        MatcherKind::Jwt,
        MatcherKind::JwtJsonPath,
        MatcherKind::Form,
    ];

    /// Tag used in simulations.
    pub fn name(self) -> &'static str {
        match self {
            MatcherKind::Exact => "exact",
            MatcherKind::Glob => "glob",
            MatcherKind::Regex => "regex",
            MatcherKind::Json => "json",
            MatcherKind::JsonPartial => "jsonpartial",
            MatcherKind::JsonPath => "jsonpath",
            MatcherKind::Xpath => "xpath",
            MatcherKind::Xml => "xml",
            MatcherKind::XmlTemplated => "xmltemplated",
            MatcherKind::Array => "array",
            MatcherKind::ContainsExactly => "containsexactly",
            MatcherKind::Contains => "contains",
            MatcherKind::ContainsOnly => "containsonly",
            MatcherKind::Negate => "negate",
            MatcherKind::Jwt => "jwt",
            MatcherKind::JwtJsonPath => "jwtjsonpath",
            MatcherKind::Form => "form",
        }
    }

    /// Score contributed by one successful match of this kind.
    pub fn score(self) -> u32 {
        match self {
            MatcherKind::Exact | MatcherKind::ContainsExactly => 2,
            _ => 1,
        }
    }
}

impl AsRef<str> for MatcherKind {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name to kind lookup, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct MatcherRegistry {
    kinds: HashMap<String, MatcherKind>,
}

impl MatcherRegistry {
    /// Registry containing every built-in kind.
    pub fn standard() -> Self {
        Self::with_kinds(MatcherKind::ALL)
    }

    pub fn with_kinds(kinds: impl IntoIterator<Item = MatcherKind>) -> Self {
        Self {
            kinds: kinds
                .into_iter()
                .map(|kind| (kind.name().to_string(), kind))
                .collect(),
        }
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<MatcherKind> {
        self.kinds.get(&name.to_lowercase()).copied()
    }

    /// Lookup that treats unknown kinds as exact (deprecated whole-query field).
    pub fn lookup_or_exact(&self, name: &str) -> MatcherKind {
        self.lookup(name).unwrap_or_else(|| {
            warn!("Unknown matcher '{}', falling back to exact matching", name);
            MatcherKind::Exact
        })
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// A matcher value bound to its kind, with regexes compiled up front.
#[derive(Debug, Clone)]
pub struct ValueMatcher {
    kind: MatcherKind,
    value: MatcherValue,
    config: MatcherConfig,
    /// Compiled pattern for the regex kind; `None` if the pattern is invalid
    regex: Option<Arc<Regex>>,
}

impl ValueMatcher {
    pub fn compile(kind: MatcherKind, value: MatcherValue, config: MatcherConfig) -> Self {
        let regex = match (kind, value.as_str()) {
            (MatcherKind::Regex, Some(pattern)) => match Regex::new(pattern) {
                Ok(regex) => Some(Arc::new(regex)),
                Err(e) => {
                    warn!("Invalid regex matcher '{}': {}", pattern, e);
                    None
                }
            },
            _ => None,
        };

        Self {
            kind,
            value,
            config,
            regex,
        }
    }

    pub fn kind(&self) -> MatcherKind {
        self.kind
    }

    pub fn value(&self) -> &MatcherValue {
        &self.value
    }

    /// Apply the matcher; `Some(extracted)` on success.
    pub fn matches(&self, candidate: &str) -> Option<String> {
        let matched = match self.kind {
            MatcherKind::Exact => string::exact_match(&self.value, candidate),
            MatcherKind::Glob => string::glob_match(&self.value, candidate),
            MatcherKind::Regex => self
                .regex
                .as_ref()
                .is_some_and(|regex| regex.is_match(candidate)),
            MatcherKind::Negate => string::negation_match(&self.value, candidate),
            MatcherKind::Json => json_match(&self.value, candidate),
            MatcherKind::JsonPartial => json_partial_match(&self.value, candidate),
            MatcherKind::JsonPath => return json_path_match(&self.value, candidate),
            MatcherKind::Xpath => return xpath_match(&self.value, candidate),
            MatcherKind::Xml => xml_match(&self.value, candidate),
            MatcherKind::XmlTemplated => xml_templated_match(&self.value, candidate),
            MatcherKind::Array => array::array_match(&self.value, candidate, &self.config),
            MatcherKind::ContainsExactly => array::contains_exactly_match(&self.value, candidate),
            MatcherKind::Contains => array::contains_match(&self.value, candidate),
            MatcherKind::ContainsOnly => array::contains_only_match(&self.value, candidate),
            MatcherKind::Jwt => jwt::jwt_match(&self.value, candidate),
            MatcherKind::JwtJsonPath => return jwt::jwt_json_path_match(&self.value, candidate),
            // Form values are decomposed by the body matcher
            MatcherKind::Form => false,
        };

        matched.then(|| candidate.to_string())
    }
}

/// One-shot evaluation without precompilation.
pub fn evaluate(
    kind: MatcherKind,
    value: &MatcherValue,
    candidate: &str,
    config: &MatcherConfig,
) -> Option<String> {
    ValueMatcher::compile(kind, value.clone(), config.clone()).matches(candidate)
}
