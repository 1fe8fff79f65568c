//! Request matching engine for HTTP service virtualization.
//!
//! A [`Simulation`] is an ordered list of request matcher / response pairs.
//! An inbound [`RequestDetails`] is scored against every pair by a
//! [`MatchingStrategy`]: first-match returns the first pair that passes all of
//! its gates, strongest-match returns the highest scoring pair and, on a miss,
//! the closest miss with the fields that failed. Verdicts that cannot depend
//! on headers or state are cached by request fingerprint.
//!
//! ```no_run
//! use rift_matcher::{RequestDetails, SimulationDocument, SimulationMatcher, StrategyKind};
//!
//! let document: SimulationDocument = serde_json::from_str(r#"{"pairs": []}"#).unwrap();
//! let matcher = SimulationMatcher::new(StrategyKind::Strongest, false);
//! matcher.replace_simulation(document).unwrap();
//!
//! let request = RequestDetails {
//!     method: "GET".to_string(),
//!     path: "/users".to_string(),
//!     ..Default::default()
//! };
//! match matcher.get_response(&request) {
//!     Ok(response) => println!("{}", response.status),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod matchers;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod simulation;
pub mod state;

pub use cache::{Cache, CacheStats, InMemoryCache, NoCache};
pub use config::{CacheSettings, MatcherSettings};
pub use error::{CacheError, MatchError, MatchingError};
pub use matchers::{MatcherKind, MatcherRegistry, ValueMatcher};
pub use matching::{
    match_request, CacheMatcher, FieldMatch, MatchField, MatchingResult, MatchingStrategy,
    SimulationMatcher, StrategyKind,
};
pub use metrics::collect_metrics;
pub use models::{
    CachedResponse, ClosestMiss, MatcherConfig, MatcherValue, RequestDetails,
    RequestFieldMatcher, RequestMatcher, RequestMatcherResponsePair, ResponseDetails,
};
pub use simulation::{Simulation, SimulationDocument};
pub use state::{State, StateReader, StateWriter};
