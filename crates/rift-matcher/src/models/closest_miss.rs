//! Diagnostics for requests that matched no pair.

use super::matcher::{RequestMatcher, ResponseDetails};
use super::request::RequestDetails;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;

/// Best-scoring non-matching pair found during a strongest-match scan.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosestMiss {
    pub request: RequestDetails,
    pub request_matcher: RequestMatcher,
    pub response: ResponseDetails,
    /// Field names that failed, in evaluation order
    pub missed_fields: Vec<String>,
    /// State at the time of the miss
    pub state: BTreeMap<String, String>,
}

impl ClosestMiss {
    /// Human-readable explanation of the miss.
    ///
    /// The section titles and the four-space JSON indentation are relied on by
    /// existing consumers and must not change.
    pub fn message(&self) -> String {
        format!(
            "\n\nThe following request was made, but was not matched by Hoverfly:\n\n{}\
             \n\nWhilst Hoverfly has the following state:\n\n{}\
             \n\nThe matcher which came closest was:\n\n{}\
             \n\nBut it did not match on the following fields:\n\n[{}]\
             \n\nWhich if hit would have given the following response:\n\n{}",
            pretty(&self.request.view()),
            pretty(&self.state),
            pretty(&self.request_matcher),
            self.missed_fields.join(", "),
            pretty(&self.response),
        )
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
