//! Entry point tying simulation, state, cache and strategy together.

use super::cache_matcher::CacheMatcher;
use super::runner::match_request;
use super::strategy::StrategyKind;
use crate::cache::{Cache, InMemoryCache};
use crate::config::MatcherSettings;
use crate::error::MatchingError;
use crate::matchers::MatcherRegistry;
use crate::metrics::record_match;
use crate::models::{CachedResponse, RequestDetails, RequestMatcherResponsePair, ResponseDetails};
use crate::simulation::{Simulation, SimulationDocument};
use crate::state::{State, StateWriter};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answers requests from a simulation.
///
/// The simulation sits behind a reader/writer lock held for the duration of
/// one scan. Replacing it takes the write lock, flushes the cache and
/// re-preloads it.
#[derive(Debug)]
pub struct SimulationMatcher {
    registry: MatcherRegistry,
    simulation: RwLock<Simulation>,
    state: Arc<State>,
    cache: CacheMatcher,
    preload: bool,
    strategy: StrategyKind,
    webserver: bool,
}

impl SimulationMatcher {
    /// Matcher without a cache.
    pub fn new(strategy: StrategyKind, webserver: bool) -> Self {
        Self {
            registry: MatcherRegistry::standard(),
            simulation: RwLock::new(Simulation::new()),
            state: Arc::new(State::new()),
            cache: CacheMatcher::new(None, webserver),
            preload: false,
            strategy,
            webserver,
        }
    }

    pub fn from_settings(settings: &MatcherSettings) -> Self {
        let matcher = Self::new(settings.strategy, settings.webserver);
        if settings.cache.enabled {
            matcher.with_cache(
                Arc::new(InMemoryCache::new(settings.cache.max_size)),
                settings.cache.preload,
            )
        } else {
            matcher
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>, preload: bool) -> Self {
        self.cache = CacheMatcher::new(Some(cache), self.webserver);
        self.preload = preload;
        self
    }

    pub fn with_state(mut self, state: Arc<State>) -> Self {
        self.state = state;
        self
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn state(&self) -> &Arc<State> {
        &self.state
    }

    pub fn cache(&self) -> &CacheMatcher {
        &self.cache
    }

    pub fn simulation(&self) -> SimulationDocument {
        self.simulation.read().to_document()
    }

    /// Swap in a new simulation. Nothing changes if any pair fails to compile.
    pub fn replace_simulation(&self, document: SimulationDocument) -> Result<(), MatchingError> {
        let simulation = Simulation::from_document(document, &self.registry)?;
        self.state.initialize_sequences(&simulation);

        let mut current = self.simulation.write();
        *current = simulation;
        info!("Loaded simulation with {} pairs", current.len());
        self.refresh_cache(&current)
    }

    /// Append one pair to the current simulation.
    pub fn add_pair(&self, pair: RequestMatcherResponsePair) -> Result<(), MatchingError> {
        let mut current = self.simulation.write();
        current.add_pair(pair, &self.registry)?;
        self.state.initialize_sequences(&current);
        self.refresh_cache(&current)
    }

    /// Cached verdicts may be stale once the pairs change.
    fn refresh_cache(&self, simulation: &Simulation) -> Result<(), MatchingError> {
        if !self.cache.is_enabled() {
            return Ok(());
        }
        self.cache.flush_cache()?;
        if self.preload {
            self.cache.preload_cache(simulation, self.strategy)?;
        }
        Ok(())
    }

    /// Find the response for `request`, applying any state transitions of the hit.
    pub fn get_response(&self, request: &RequestDetails) -> Result<ResponseDetails, MatchingError> {
        if self.cache.is_enabled() {
            match self.cache.get_cached_response(request) {
                Ok(cached) => return self.answer_from_cache(cached),
                Err(MatchingError::NotInCache) => {}
                Err(e) => warn!("Ignoring unreadable cache entry: {}", e),
            }
        }

        let started = Instant::now();
        // Held until the verdict is cached so a replacement cannot flush in between
        let simulation = self.simulation.read();
        let result = match_request(
            self.strategy,
            request,
            self.webserver,
            &simulation,
            self.state.as_ref(),
        );
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_match(self.strategy.name(), result.is_hit(), elapsed_ms);
        debug!(
            "{} match for {} {}: hit={} cachable={} ({:.3}ms)",
            self.strategy,
            request.method,
            request.path,
            result.is_hit(),
            result.cachable,
            elapsed_ms
        );

        if result.cachable && self.cache.is_enabled() {
            if let Err(e) =
                self.cache
                    .save_request_matcher_response_pair(request, result.pair(), result.error())
            {
                warn!("Failed to cache matching verdict: {}", e);
            }
        }
        drop(simulation);

        match result.outcome {
            Ok(pair) => {
                self.apply_transitions(&pair.response);
                Ok(pair.response)
            }
            Err(error) => Err(MatchingError::Missed {
                closest_miss: error.closest_miss,
            }),
        }
    }

    fn answer_from_cache(&self, cached: CachedResponse) -> Result<ResponseDetails, MatchingError> {
        match cached.matching_pair {
            Some(pair) => {
                info!("Serving cached response for {} {}", cached.request.method, cached.request.path);
                self.apply_transitions(&pair.response);
                Ok(pair.response)
            }
            None => Err(MatchingError::Missed {
                closest_miss: cached.closest_miss.map(Box::new),
            }),
        }
    }

    fn apply_transitions(&self, response: &ResponseDetails) {
        if !response.transitions_state.is_empty() {
            debug!("Applying state transitions: {:?}", response.transitions_state);
            self.state.patch(&response.transitions_state);
        }
        if !response.removes_state.is_empty() {
            debug!("Removing state keys: {:?}", response.removes_state);
            self.state.remove(&response.removes_state);
        }
    }
}
