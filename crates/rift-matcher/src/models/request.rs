//! Inbound request snapshot and its cache fingerprints.
//!
//! A `RequestDetails` is built once per request by the transport layer and is
//! never mutated afterwards. Every matcher reads from it; the cache matcher
//! derives its keys from it via [`RequestDetails::hash`] and
//! [`RequestDetails::hash_without_host`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

/// Multi-valued map used for query parameters, headers and form fields.
pub type MultiMap = BTreeMap<String, Vec<String>>;

/// Snapshot of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub scheme: String,
    /// Host (and optional port) the request was addressed to
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub query: MultiMap,
    #[serde(default)]
    pub headers: MultiMap,
    /// Decoded `application/x-www-form-urlencoded` body, when the transport decoded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<MultiMap>,
}

impl RequestDetails {
    /// Values of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Canonical query string: keys sorted, each value URL-encoded, joined with `&`.
    pub fn query_string(&self) -> String {
        let mut parts = Vec::new();
        for (key, values) in &self.query {
            let key = urlencoding::encode(key);
            if values.is_empty() {
                parts.push(format!("{key}="));
            }
            for value in values {
                parts.push(format!("{key}={}", urlencoding::encode(value)));
            }
        }
        parts.join("&")
    }

    /// Form fields of the request.
    ///
    /// Uses the transport-decoded form data when present, otherwise decodes the
    /// raw body as `application/x-www-form-urlencoded`.
    pub fn form_values(&self) -> Cow<'_, MultiMap> {
        match &self.form_data {
            Some(form) => Cow::Borrowed(form),
            None => Cow::Owned(parse_form_body(&self.body)),
        }
    }

    /// Full fingerprint, including the destination (proxy mode).
    pub fn hash(&self) -> String {
        self.fingerprint(true)
    }

    /// Fingerprint without the destination (webserver mode).
    pub fn hash_without_host(&self) -> String {
        self.fingerprint(false)
    }

    fn fingerprint(&self, with_host: bool) -> String {
        let mut hasher = Sha256::new();
        let mut component = |value: &str| {
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        };

        component(self.method.as_str());
        component(self.scheme.as_str());
        if with_host {
            component(self.destination.as_str());
        }
        component(self.path.as_str());
        component(self.query_string().as_str());
        component(self.normalized_body().as_ref());

        format!("{:x}", hasher.finalize())
    }

    /// Body as it participates in the fingerprint. JSON bodies are minified so
    /// formatting differences do not produce distinct keys.
    fn normalized_body(&self) -> Cow<'_, str> {
        let is_json = self
            .header("Content-Type")
            .is_some_and(|values| values.iter().any(|v| v.to_lowercase().contains("json")));

        if is_json && !self.body.is_empty() {
            match serde_json::from_str::<serde_json::Value>(&self.body) {
                Ok(value) => return Cow::Owned(value.to_string()),
                Err(e) => debug!("Failed to minify JSON body for fingerprint: {}", e),
            }
        }
        Cow::Borrowed(&self.body)
    }

    /// Diagnostic view with the key layout used in closest-miss messages.
    pub fn view(&self) -> RequestDetailsView<'_> {
        RequestDetailsView {
            path: &self.path,
            method: &self.method,
            destination: &self.destination,
            scheme: &self.scheme,
            query: &self.query,
            body: &self.body,
            headers: &self.headers,
        }
    }
}

/// Serializable view of a request used in closest-miss messages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestDetailsView<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub destination: &'a str,
    pub scheme: &'a str,
    pub query: &'a MultiMap,
    pub body: &'a str,
    pub headers: &'a MultiMap,
}

/// Decode an urlencoded body into a multi-valued map.
pub fn parse_form_body(body: &str) -> MultiMap {
    let mut form = MultiMap::new();
    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let decode = |s: &str| {
            let s = s.replace('+', " ");
            urlencoding::decode(&s)
                .map(|d| d.into_owned())
                .unwrap_or(s)
        };
        form.entry(decode(key)).or_default().push(decode(value));
    }
    form
}
