//! Session state consulted by state matchers.
//!
//! The matching core only ever sees a [`StateReader`]. Mutation goes through
//! [`StateWriter`], which is handed to the code executing response side
//! effects (state transitions, sequence counters).

use crate::simulation::Simulation;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const SEQUENCE_PREFIX: &str = "sequence:";

/// Read capability over the state store.
pub trait StateReader: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Copy of the whole store, for diagnostics.
    fn snapshot(&self) -> BTreeMap<String, String>;
}

/// Write capability over the state store.
pub trait StateWriter: StateReader {
    fn set(&self, key: &str, value: &str);

    /// Insert or overwrite every entry of `patch`.
    fn patch(&self, patch: &BTreeMap<String, String>);

    fn remove(&self, keys: &[String]);

    /// Replace the whole store.
    fn reset(&self, state: BTreeMap<String, String>);
}

/// In-memory key/value state guarded by a reader/writer lock.
#[derive(Debug, Default)]
pub struct State {
    entries: RwLock<HashMap<String, String>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Seed every `sequence:*` key required by the simulation to `"1"` if absent.
    pub fn initialize_sequences(&self, simulation: &Simulation) {
        let mut entries = self.entries.write();
        for pair in simulation.pairs() {
            for key in pair.source.request_matcher.requires_state.keys() {
                if key.starts_with(SEQUENCE_PREFIX) && !entries.contains_key(key) {
                    debug!("Initialising sequence state key {}", key);
                    entries.insert(key.clone(), "1".to_string());
                }
            }
        }
    }
}

impl StateReader for State {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl StateWriter for State {
    fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
    }

    fn patch(&self, patch: &BTreeMap<String, String>) {
        let mut entries = self.entries.write();
        for (key, value) in patch {
            entries.insert(key.clone(), value.clone());
        }
    }

    fn remove(&self, keys: &[String]) {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
    }

    fn reset(&self, state: BTreeMap<String, String>) {
        *self.entries.write() = state.into_iter().collect();
    }
}
