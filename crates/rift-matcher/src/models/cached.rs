use super::closest_miss::ClosestMiss;
use super::matcher::RequestMatcherResponsePair;
use super::request::RequestDetails;
use serde::{Deserialize, Serialize};

/// Persisted verdict for one request fingerprint.
///
/// Exactly one of `matching_pair` / `closest_miss` is meaningful: a cached hit
/// carries the pair, a cached miss may carry the closest miss.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    pub request: RequestDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_pair: Option<RequestMatcherResponsePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closest_miss: Option<ClosestMiss>,
}

impl CachedResponse {
    pub fn is_hit(&self) -> bool {
        self.matching_pair.is_some()
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
