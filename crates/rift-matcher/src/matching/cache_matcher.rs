//! Caches matching verdicts keyed by request fingerprint.

use crate::cache::Cache;
use crate::error::{MatchError, MatchingError};
use crate::metrics::record_cache_op;
use crate::models::{CachedResponse, RequestDetails, RequestMatcherResponsePair};
use crate::simulation::Simulation;
use super::strategy::StrategyKind;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache front for the matching strategies.
///
/// Without a backend every operation fails with [`MatchingError::NoCacheSet`].
#[derive(Clone)]
pub struct CacheMatcher {
    cache: Option<Arc<dyn Cache>>,
    webserver: bool,
}

impl std::fmt::Debug for CacheMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheMatcher")
            .field("cache", &self.cache.is_some())
            .field("webserver", &self.webserver)
            .finish()
    }
}

impl CacheMatcher {
    pub fn new(cache: Option<Arc<dyn Cache>>, webserver: bool) -> Self {
        Self { cache, webserver }
    }

    /// Matcher with no backend.
    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn Cache>, MatchingError> {
        self.cache.as_ref().ok_or(MatchingError::NoCacheSet)
    }

    fn key(&self, request: &RequestDetails) -> String {
        if self.webserver {
            request.hash_without_host()
        } else {
            request.hash()
        }
    }

    pub fn get_cached_response(
        &self,
        request: &RequestDetails,
    ) -> Result<CachedResponse, MatchingError> {
        let cache = self.backend()?;
        let key = self.key(request);

        let Some(bytes) = cache.get(&key) else {
            record_cache_op("get", "miss");
            return Err(MatchingError::NotInCache);
        };

        let cached = CachedResponse::decode(&bytes).map_err(|e| {
            warn!("Failed to decode cache entry {}: {}", key, e);
            record_cache_op("get", "error");
            MatchingError::Decode(e)
        })?;
        record_cache_op("get", "hit");
        debug!("Cache hit for {} {}{}", request.method, request.destination, request.path);
        Ok(cached)
    }

    /// Store a verdict under the request's fingerprint. A miss keeps its closest miss.
    pub fn save_request_matcher_response_pair(
        &self,
        request: &RequestDetails,
        pair: Option<&RequestMatcherResponsePair>,
        match_error: Option<&MatchError>,
    ) -> Result<CachedResponse, MatchingError> {
        let cache = self.backend()?;
        let key = self.key(request);

        let cached = CachedResponse {
            request: request.clone(),
            matching_pair: pair.cloned(),
            closest_miss: match_error
                .and_then(|e| e.closest_miss.as_deref())
                .cloned(),
        };

        let stored = cached
            .encode()
            .map_err(Into::into)
            .and_then(|bytes| cache.set(&key, bytes));
        match stored {
            Ok(()) => {
                record_cache_op("save", "success");
                debug!("Cached verdict under {}", key);
                Ok(cached)
            }
            Err(e) => {
                record_cache_op("save", "error");
                Err(MatchingError::Cache(e))
            }
        }
    }

    pub fn flush_cache(&self) -> Result<(), MatchingError> {
        let cache = self.backend()?;
        cache.delete_data()?;
        record_cache_op("flush", "success");
        debug!("Flushed matcher cache");
        Ok(())
    }

    /// Seed the cache with every pair whose matcher pins down a single request.
    ///
    /// When several pairs pin down the same request, the entry left in the
    /// cache is the one `strategy` would pick: the earliest pair for
    /// first-match, the latest for strongest-match. Returns the number of
    /// entries written.
    pub fn preload_cache(
        &self,
        simulation: &Simulation,
        strategy: StrategyKind,
    ) -> Result<usize, MatchingError> {
        self.backend()?;

        let mut seen = HashSet::new();
        let mut preloaded = 0;
        for pair in simulation.pairs() {
            let Some(request) = pair.source.request_matcher.to_eagerly_cacheable() else {
                continue;
            };
            if !seen.insert(self.key(&request)) && strategy == StrategyKind::First {
                debug!("Keeping earlier preloaded pair for {} {}", request.method, request.path);
                continue;
            }
            self.save_request_matcher_response_pair(&request, Some(&pair.source), None)?;
            preloaded += 1;
        }

        record_cache_op("preload", "success");
        info!(
            "Preloaded {} of {} pairs into the matcher cache",
            preloaded,
            simulation.len()
        );
        Ok(preloaded)
    }

    /// Decode every cache entry, sorted by key for a stable listing.
    pub fn get_all_responses(&self) -> Result<Vec<CachedResponse>, MatchingError> {
        let cache = self.backend()?;
        let mut entries: Vec<_> = cache.get_all_entries()?.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        entries
            .into_iter()
            .map(|(_, bytes)| CachedResponse::decode(&bytes).map_err(MatchingError::Decode))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::error::CacheError;
    use crate::matchers::MatcherRegistry;
    use crate::models::{ClosestMiss, RequestFieldMatcher, RequestMatcher, ResponseDetails};
    use std::collections::HashMap;

    fn cache_matcher(webserver: bool) -> CacheMatcher {
        CacheMatcher::new(Some(Arc::new(InMemoryCache::new(100))), webserver)
    }

    fn request(destination: &str) -> RequestDetails {
        RequestDetails {
            method: "GET".to_string(),
            scheme: "http".to_string(),
            destination: destination.to_string(),
            path: "/a".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_cache_set() {
        let matcher = CacheMatcher::disabled();
        assert!(matches!(
            matcher.get_cached_response(&request("x")),
            Err(MatchingError::NoCacheSet)
        ));
        assert!(matches!(matcher.flush_cache(), Err(MatchingError::NoCacheSet)));
        assert!(matches!(
            matcher.preload_cache(&Simulation::new(), StrategyKind::Strongest),
            Err(MatchingError::NoCacheSet)
        ));
    }

    #[test]
    fn test_not_in_cache() {
        let matcher = cache_matcher(false);
        let err = matcher.get_cached_response(&request("x")).unwrap_err();
        assert!(matches!(err, MatchingError::NotInCache));
        assert_eq!(err.to_string(), "Could not find recorded request in cache");
    }

    #[test]
    fn test_save_and_get_hit() {
        let matcher = cache_matcher(false);
        let pair = RequestMatcherResponsePair::default();
        matcher
            .save_request_matcher_response_pair(&request("x"), Some(&pair), None)
            .unwrap();

        let cached = matcher.get_cached_response(&request("x")).unwrap();
        assert!(cached.is_hit());
        assert_eq!(cached.matching_pair, Some(pair));
        assert!(matcher.get_cached_response(&request("y")).is_err());
    }

    #[test]
    fn test_save_miss_keeps_closest_miss() {
        let matcher = cache_matcher(false);
        let error = MatchError {
            closest_miss: Some(Box::new(ClosestMiss {
                missed_fields: vec!["path".to_string()],
                ..Default::default()
            })),
            ..Default::default()
        };
        matcher
            .save_request_matcher_response_pair(&request("x"), None, Some(&error))
            .unwrap();

        let cached = matcher.get_cached_response(&request("x")).unwrap();
        assert!(!cached.is_hit());
        assert_eq!(cached.closest_miss.unwrap().missed_fields, vec!["path".to_string()]);
    }

    #[test]
    fn test_webserver_mode_ignores_destination() {
        let matcher = cache_matcher(true);
        matcher
            .save_request_matcher_response_pair(
                &request("a.com"),
                Some(&RequestMatcherResponsePair::default()),
                None,
            )
            .unwrap();
        assert!(matcher.get_cached_response(&request("b.com")).is_ok());
    }

    #[test]
    fn test_flush() {
        let matcher = cache_matcher(false);
        matcher
            .save_request_matcher_response_pair(&request("x"), None, None)
            .unwrap();
        matcher.flush_cache().unwrap();
        assert!(matcher.get_all_responses().unwrap().is_empty());
    }

    #[test]
    fn test_preload_only_exact_pairs() {
        let registry = MatcherRegistry::standard();
        let mut simulation = Simulation::new();
        simulation
            .add_pair(
                RequestMatcherResponsePair::new(
                    RequestMatcher {
                        method: vec![RequestFieldMatcher::new("exact", "GET")],
                        destination: vec![RequestFieldMatcher::new("exact", "x")],
                        scheme: vec![RequestFieldMatcher::new("exact", "http")],
                        path: vec![RequestFieldMatcher::new("exact", "/a")],
                        body: vec![RequestFieldMatcher::new("exact", "")],
                        ..Default::default()
                    },
                    ResponseDetails::default(),
                ),
                &registry,
            )
            .unwrap();
        simulation
            .add_pair(
                RequestMatcherResponsePair::new(
                    RequestMatcher {
                        path: vec![RequestFieldMatcher::new("glob", "/*")],
                        ..Default::default()
                    },
                    ResponseDetails::default(),
                ),
                &registry,
            )
            .unwrap();

        let matcher = cache_matcher(false);
        assert_eq!(matcher.preload_cache(&simulation, StrategyKind::First).unwrap(), 1);
        assert_eq!(matcher.get_all_responses().unwrap().len(), 1);
        assert!(matcher.get_cached_response(&request("x")).unwrap().is_hit());
    }

    struct FailingCache;

    impl Cache for FailingCache {
        fn get(&self, _key: &str) -> Option<Vec<u8>> {
            Some(b"not json".to_vec())
        }

        fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
            Err(CacheError::Backend("read only".to_string()))
        }

        fn get_all_entries(&self) -> Result<HashMap<String, Vec<u8>>, CacheError> {
            Err(CacheError::Backend("unavailable".to_string()))
        }

        fn delete_data(&self) -> Result<(), CacheError> {
            Ok(())
        }

        fn get_all_keys(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_backend_errors_surface() {
        let matcher = CacheMatcher::new(Some(Arc::new(FailingCache)), false);
        assert!(matches!(
            matcher.get_cached_response(&request("x")),
            Err(MatchingError::Decode(_))
        ));
        assert!(matches!(
            matcher.save_request_matcher_response_pair(&request("x"), None, None),
            Err(MatchingError::Cache(_))
        ));
        assert!(matches!(
            matcher.get_all_responses(),
            Err(MatchingError::Cache(_))
        ));
    }
}
