use super::Cache;
use crate::error::CacheError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

#[derive(Debug)]
struct CacheEntry {
    value: Vec<u8>,
    /// Logical clock value of the last access
    last_accessed: u64,
}

/// Counters describing cache activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// Bounded in-memory cache evicting the least recently used entry.
#[derive(Debug)]
pub struct InMemoryCache {
    max_size: usize,
    clock: AtomicU64,
    /// Entries and stats share one lock so they never disagree
    state: RwLock<CacheState>,
}

impl InMemoryCache {
    pub fn new(max_size: usize) -> Self {
        debug!("Creating in-memory cache: max_size={}", max_size);
        Self {
            max_size: max_size.max(1),
            clock: AtomicU64::new(0),
            state: RwLock::new(CacheState::default()),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        self.state.read().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_lru(state: &mut CacheState) {
        let oldest = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            state.entries.remove(&key);
            state.stats.evictions += 1;
            trace!("Evicted LRU cache entry: {}", key);
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.tick();
        let mut state = self.state.write();

        let value = state.entries.get_mut(key).map(|entry| {
            entry.last_accessed = now;
            entry.value.clone()
        });

        if value.is_some() {
            trace!("Cache hit for key: {}", key);
            state.stats.hits += 1;
        } else {
            trace!("Cache miss for key: {}", key);
            state.stats.misses += 1;
        }
        value
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let now = self.tick();
        let mut state = self.state.write();

        if state.entries.len() >= self.max_size && !state.entries.contains_key(key) {
            Self::evict_lru(&mut state);
        }

        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                last_accessed: now,
            },
        );
        state.stats.inserts += 1;
        state.stats.size = state.entries.len();
        Ok(())
    }

    fn get_all_entries(&self) -> Result<HashMap<String, Vec<u8>>, CacheError> {
        Ok(self
            .state
            .read()
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }

    fn delete_data(&self) -> Result<(), CacheError> {
        let mut state = self.state.write();
        state.entries.clear();
        state.stats.size = 0;
        debug!("Cache cleared");
        Ok(())
    }

    fn get_all_keys(&self) -> Vec<String> {
        self.state.read().entries.keys().cloned().collect()
    }
}
