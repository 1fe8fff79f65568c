//! Matching strategy protocol.
//!
//! A strategy is a fold over the simulation. For each pair the runner starts a
//! fresh accumulator with [`MatchingStrategy::pre_matching`], feeds it one
//! [`FieldMatch`] per field through [`MatchingStrategy::matching`] (a `Break`
//! skips the remaining fields of that pair), then hands the accumulator to
//! [`MatchingStrategy::post_matching`]. Breaking there ends the scan with a
//! result; otherwise the scan continues with the returned strategy state and
//! [`MatchingStrategy::result`] gives the verdict once all pairs are seen.

use super::field::{FieldMatch, MatchField};
use super::request_matcher::CompiledPair;
use crate::error::MatchError;
use crate::models::{RequestDetails, RequestMatcherResponsePair};
use crate::state::StateReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

/// Terminal output of a strategy run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingResult {
    pub outcome: Result<RequestMatcherResponsePair, MatchError>,
    /// Whether the verdict may be reused for an identical future request
    pub cachable: bool,
}

impl MatchingResult {
    pub fn hit(pair: RequestMatcherResponsePair, cachable: bool) -> Self {
        Self {
            outcome: Ok(pair),
            cachable,
        }
    }

    pub fn miss(error: MatchError, cachable: bool) -> Self {
        Self {
            outcome: Err(error),
            cachable,
        }
    }

    pub fn pair(&self) -> Option<&RequestMatcherResponsePair> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&MatchError> {
        self.outcome.as_ref().err()
    }

    pub fn is_hit(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// What a strategy sees once all fields of a pair have been folded.
pub struct PairContext<'a> {
    pub request: &'a RequestDetails,
    pub pair: &'a CompiledPair,
    pub state: &'a dyn StateReader,
}

pub trait MatchingStrategy: Sized {
    /// Per-pair accumulator.
    type Acc;

    fn pre_matching(&self) -> Self::Acc;

    /// Evaluate one field of a pair. Uses the scored matchers by default.
    fn evaluate_field(
        &self,
        pair: &CompiledPair,
        field: MatchField,
        request: &RequestDetails,
        state: &dyn StateReader,
    ) -> FieldMatch {
        pair.matcher.evaluate_field(field, request, state)
    }

    /// Fold one field into the accumulator.
    fn matching(
        &self,
        acc: Self::Acc,
        field_match: FieldMatch,
        field: MatchField,
    ) -> ControlFlow<Self::Acc, Self::Acc>;

    /// Conclude one pair.
    fn post_matching(self, acc: Self::Acc, ctx: PairContext<'_>)
        -> ControlFlow<MatchingResult, Self>;

    /// Verdict after every pair was considered without an early result.
    fn result(self) -> MatchingResult;
}

/// Strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    First,
    #[default]
    Strongest,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::First => "first",
            StrategyKind::Strongest => "strongest",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(StrategyKind::First),
            "strongest" => Ok(StrategyKind::Strongest),
            other => Err(format!(
                "Unknown matching strategy '{other}', expected 'first' or 'strongest'"
            )),
        }
    }
}
