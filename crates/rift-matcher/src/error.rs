//! Error types for the matching engine.

use crate::models::ClosestMiss;
use thiserror::Error;

/// Errors surfaced by the cache matcher and the simulation matcher.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("No cache set")]
    NoCacheSet,

    #[error("Could not find recorded request in cache")]
    NotInCache,

    #[error("Failed to decode payload from cache")]
    Decode(#[source] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Unknown matcher: {0}")]
    UnknownMatcher(String),

    #[error("Could not find a match for request, create or record a valid matcher first!{}", closest_miss.as_ref().map(|m| m.message()).unwrap_or_default())]
    Missed {
        closest_miss: Option<Box<ClosestMiss>>,
    },
}

impl MatchingError {
    /// HTTP status the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            MatchingError::NotInCache | MatchingError::Missed { .. } => 412,
            _ => 500,
        }
    }
}

/// Terminal miss of a matching strategy.
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("No match found")]
pub struct MatchError {
    pub closest_miss: Option<Box<ClosestMiss>>,
    /// Some pair failed only on headers
    pub matched_on_all_but_headers_at_least_once: bool,
    /// Some pair failed only on state
    pub matched_on_all_but_state_at_least_once: bool,
}

/// Cache backend failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MatchingError::NotInCache.status_code(), 412);
        assert_eq!(MatchingError::Missed { closest_miss: None }.status_code(), 412);
        assert_eq!(MatchingError::NoCacheSet.status_code(), 500);
        assert_eq!(
            MatchingError::Cache(CacheError::Backend("down".to_string())).status_code(),
            500
        );
    }

    #[test]
    fn test_missed_message_includes_closest_miss() {
        let plain = MatchingError::Missed { closest_miss: None };
        assert_eq!(
            plain.to_string(),
            "Could not find a match for request, create or record a valid matcher first!"
        );

        let with_miss = MatchingError::Missed {
            closest_miss: Some(Box::new(ClosestMiss {
                missed_fields: vec!["method".to_string()],
                ..Default::default()
            })),
        };
        let message = with_miss.to_string();
        assert!(message.starts_with(
            "Could not find a match for request, create or record a valid matcher first!\n\nThe following request was made"
        ));
        assert!(message.contains("[method]"));
    }

    #[test]
    fn test_match_error_display() {
        assert_eq!(MatchError::default().to_string(), "No match found");
    }
}
