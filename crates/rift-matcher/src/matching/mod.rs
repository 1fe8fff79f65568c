//! Request matching.
//!
//! Field matchers turn a request into per-field [`FieldMatch`] results, the
//! strategies fold those results over a simulation, and the
//! [`SimulationMatcher`] wraps the scan with caching and state transitions.

mod body;
mod cache_matcher;
mod cacheability;
mod field;
mod first_match;
mod headers;
mod query;
mod request_matcher;
mod runner;
mod simulation_matcher;
mod state_matcher;
mod strategy;
mod strongest_match;

pub use body::body_match;
pub use cache_matcher::CacheMatcher;
pub use cacheability::is_cachable;
pub use field::{CompiledFieldMatcher, CompiledFieldMatchers, FieldMatch, MatchField};
pub use first_match::{FirstMatchAcc, FirstMatchStrategy};
pub use headers::{header_match, CompiledKeyedMatchers};
pub use query::{deprecated_query_match, query_match};
pub use request_matcher::{CompiledPair, CompiledRequestMatcher, FIELD_ORDER};
pub use runner::{match_request, run};
pub use simulation_matcher::SimulationMatcher;
pub use state_matcher::state_match;
pub use strategy::{MatchingResult, MatchingStrategy, PairContext, StrategyKind};
pub use strongest_match::{StrongestMatchAcc, StrongestMatchStrategy};
