//! Request matcher configuration types.
//!
//! These are the user-authored rules as they appear in a simulation. They are
//! plain data; [`crate::matching::CompiledRequestMatcher`] turns them into the
//! runtime form used by the strategies.

use super::request::{MultiMap, RequestDetails};
use crate::matchers::MatcherKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Value carried by a field matcher.
///
/// The shape depends on the matcher kind: most kinds take a string, the array
/// family takes a list of strings, and `form` takes a map of form field name to
/// nested matchers. Anything else is kept as raw JSON so a misconfigured matcher
/// still loads and simply fails its own rule.
#[derive(Debug, Clone, PartialEq)]
pub enum MatcherValue {
    String(String),
    StringList(Vec<String>),
    Form(BTreeMap<String, Vec<RequestFieldMatcher>>),
    Json(Value),
}

impl MatcherValue {
    /// Build a matcher value from raw JSON, interpreting objects as form field
    /// matchers only for the `form` kind.
    pub fn from_json(kind: &str, value: Value) -> Self {
        match value {
            Value::String(s) => MatcherValue::String(s),
            Value::Array(items) if items.iter().all(Value::is_string) => MatcherValue::StringList(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Object(_) if kind.eq_ignore_ascii_case(MatcherKind::Form.name()) => {
                match serde_json::from_value(value.clone()) {
                    Ok(form) => MatcherValue::Form(form),
                    Err(_) => MatcherValue::Json(value),
                }
            }
            other => MatcherValue::Json(other),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            MatcherValue::String(s) => Value::String(s.clone()),
            MatcherValue::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            MatcherValue::Form(form) => serde_json::to_value(form).unwrap_or_default(),
            MatcherValue::Json(value) => value.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MatcherValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// String list view: a list value, or a single string treated as a one-element list.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            MatcherValue::StringList(items) => Some(items.clone()),
            MatcherValue::String(s) => Some(vec![s.clone()]),
            MatcherValue::Json(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl Default for MatcherValue {
    fn default() -> Self {
        MatcherValue::Json(Value::Null)
    }
}

impl From<&str> for MatcherValue {
    fn from(value: &str) -> Self {
        MatcherValue::String(value.to_string())
    }
}

impl From<String> for MatcherValue {
    fn from(value: String) -> Self {
        MatcherValue::String(value)
    }
}

impl From<Vec<String>> for MatcherValue {
    fn from(value: Vec<String>) -> Self {
        MatcherValue::StringList(value)
    }
}

impl From<Vec<&str>> for MatcherValue {
    fn from(value: Vec<&str>) -> Self {
        MatcherValue::StringList(value.into_iter().map(String::from).collect())
    }
}

impl From<BTreeMap<String, Vec<RequestFieldMatcher>>> for MatcherValue {
    fn from(value: BTreeMap<String, Vec<RequestFieldMatcher>>) -> Self {
        MatcherValue::Form(value)
    }
}

impl From<Value> for MatcherValue {
    fn from(value: Value) -> Self {
        MatcherValue::Json(value)
    }
}

/// Matcher-specific options, e.g. `ignoreOrder` for the array matcher.
///
/// Keys are compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MatcherConfig(BTreeMap<String, Value>);

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Boolean option; non-boolean values fall back to the default.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

/// One matching rule applied to a single request field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "RawFieldMatcher", into = "RawFieldMatcher")]
pub struct RequestFieldMatcher {
    /// Matcher kind tag, e.g. `exact` or `jsonpath` (case-insensitive)
    pub matcher: String,
    pub value: MatcherValue,
    pub config: MatcherConfig,
    /// Matcher applied to the value extracted by this one
    pub do_match: Option<Box<RequestFieldMatcher>>,
}

impl RequestFieldMatcher {
    pub fn new(kind: impl AsRef<str>, value: impl Into<MatcherValue>) -> Self {
        Self {
            matcher: kind.as_ref().to_string(),
            value: value.into(),
            config: MatcherConfig::default(),
            do_match: None,
        }
    }

    pub fn with_config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Chain a matcher onto the value this matcher extracts.
    pub fn then(mut self, next: RequestFieldMatcher) -> Self {
        self.do_match = Some(Box::new(next));
        self
    }

    pub fn is_kind(&self, kind: MatcherKind) -> bool {
        self.matcher.eq_ignore_ascii_case(kind.name())
    }

    /// The literal value of a lone exact matcher, used for eager caching.
    fn exact_literal(&self) -> Option<&str> {
        if self.is_kind(MatcherKind::Exact) && self.do_match.is_none() {
            self.value.as_str()
        } else {
            None
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawFieldMatcher {
    matcher: String,
    #[serde(default)]
    value: Value,
    #[serde(default, skip_serializing_if = "MatcherConfig::is_empty")]
    config: MatcherConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    do_match: Option<Box<RequestFieldMatcher>>,
}

impl From<RawFieldMatcher> for RequestFieldMatcher {
    fn from(raw: RawFieldMatcher) -> Self {
        let value = MatcherValue::from_json(&raw.matcher, raw.value);
        Self {
            matcher: raw.matcher,
            value,
            config: raw.config,
            do_match: raw.do_match,
        }
    }
}

impl From<RequestFieldMatcher> for RawFieldMatcher {
    fn from(matcher: RequestFieldMatcher) -> Self {
        Self {
            value: matcher.value.to_json(),
            matcher: matcher.matcher,
            config: matcher.config,
            do_match: matcher.do_match,
        }
    }
}

/// Per-key matchers for headers and query parameters.
pub type KeyedMatchers = BTreeMap<String, Vec<RequestFieldMatcher>>;

/// Bundle of field matchers describing which requests a pair answers.
///
/// An empty matcher list for a field means the field always matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcher {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<RequestFieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<RequestFieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<RequestFieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scheme: Vec<RequestFieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<RequestFieldMatcher>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: KeyedMatchers,
    /// Per-key query matchers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<KeyedMatchers>,
    /// Deprecated: matchers over the whole canonical query string
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprecated_query: Vec<RequestFieldMatcher>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requires_state: BTreeMap<String, String>,
}

impl RequestMatcher {
    pub fn includes_header_matching(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn includes_state_matching(&self) -> bool {
        !self.requires_state.is_empty()
    }

    /// Concrete request this matcher is guaranteed to answer, if it is unambiguous.
    ///
    /// Only matchers made of a single exact rule on body, destination, method,
    /// path and scheme, exact (or unconfigured array) query rules, and no
    /// header or state requirements qualify.
    pub fn to_eagerly_cacheable(&self) -> Option<RequestDetails> {
        if self.includes_header_matching()
            || self.includes_state_matching()
            || !self.deprecated_query.is_empty()
        {
            return None;
        }

        let single_exact = |matchers: &[RequestFieldMatcher]| -> Option<String> {
            match matchers {
                [only] => only.exact_literal().map(str::to_string),
                _ => None,
            }
        };

        let body = single_exact(&self.body)?;
        let destination = single_exact(&self.destination)?;
        let method = single_exact(&self.method)?;
        let path = single_exact(&self.path)?;
        let scheme = single_exact(&self.scheme)?;

        let mut query = MultiMap::new();
        for (key, matchers) in self.query.iter().flatten() {
            for matcher in matchers {
                if let Some(literal) = matcher.exact_literal() {
                    query.insert(key.clone(), vec![literal.to_string()]);
                } else if matcher.is_kind(MatcherKind::Array)
                    && matcher.config.is_empty()
                    && matcher.do_match.is_none()
                {
                    query.insert(key.clone(), matcher.value.as_string_list()?);
                } else {
                    return None;
                }
            }
        }

        Some(RequestDetails {
            method,
            scheme,
            destination,
            path,
            body,
            query,
            ..Default::default()
        })
    }
}

/// Recorded response returned when a pair matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub encoded_body: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: MultiMap,
    #[serde(default)]
    pub templated: bool,
    /// State entries set after this response is served
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transitions_state: BTreeMap<String, String>,
    /// State keys removed after this response is served
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removes_state: Vec<String>,
}

fn default_status() -> u16 {
    200
}

/// A request matcher and the response it yields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcherResponsePair {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub request_matcher: RequestMatcher,
    pub response: ResponseDetails,
}

impl RequestMatcherResponsePair {
    pub fn new(request_matcher: RequestMatcher, response: ResponseDetails) -> Self {
        Self {
            labels: Vec::new(),
            request_matcher,
            response,
        }
    }

    /// JSON view for the admin layer.
    pub fn build_view(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
