//! Ordered collection of request matcher / response pairs.

use crate::error::MatchingError;
use crate::matchers::MatcherRegistry;
use crate::matching::CompiledPair;
use crate::models::RequestMatcherResponsePair;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Serialized simulation: `{ "pairs": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SimulationDocument {
    #[serde(default)]
    pub pairs: Vec<RequestMatcherResponsePair>,
}

/// Compiled simulation. Order is significant to both strategies.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    pairs: Vec<Arc<CompiledPair>>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every pair of a document, failing on the first invalid one.
    pub fn from_document(
        document: SimulationDocument,
        registry: &MatcherRegistry,
    ) -> Result<Self, MatchingError> {
        let mut simulation = Self::new();
        for pair in document.pairs {
            simulation.add_pair(pair, registry)?;
        }
        Ok(simulation)
    }

    /// Append a pair.
    pub fn add_pair(
        &mut self,
        pair: RequestMatcherResponsePair,
        registry: &MatcherRegistry,
    ) -> Result<(), MatchingError> {
        let compiled = CompiledPair::compile(pair, registry)?;
        self.pairs.push(Arc::new(compiled));
        debug!("Added pair #{} to simulation", self.pairs.len());
        Ok(())
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Arc<CompiledPair>> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_document(&self) -> SimulationDocument {
        SimulationDocument {
            pairs: self.pairs.iter().map(|p| p.source.clone()).collect(),
        }
    }
}
