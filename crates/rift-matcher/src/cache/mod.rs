//! Cache backends for matching verdicts.
//!
//! Keys are request fingerprints, values are encoded [`crate::models::CachedResponse`]s.
//! Backends must be safe for concurrent get/set from many request threads;
//! atomicity is only required per key.

mod inmemory;

pub use inmemory::{CacheStats, InMemoryCache};

use crate::error::CacheError;
use std::collections::HashMap;

/// Key/value store behind the cache matcher.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    fn get_all_entries(&self) -> Result<HashMap<String, Vec<u8>>, CacheError>;

    /// Remove every entry.
    fn delete_data(&self) -> Result<(), CacheError>;

    fn get_all_keys(&self) -> Vec<String>;
}

/// Backend that stores nothing. Every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
        Ok(())
    }

    fn get_all_entries(&self) -> Result<HashMap<String, Vec<u8>>, CacheError> {
        Ok(HashMap::new())
    }

    fn delete_data(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn get_all_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cache_never_stores() {
        let cache = NoCache;
        cache.set("k", b"v".to_vec()).unwrap();
        assert!(cache.get("k").is_none());
        assert!(cache.get_all_keys().is_empty());
        assert!(cache.get_all_entries().unwrap().is_empty());
    }
}
