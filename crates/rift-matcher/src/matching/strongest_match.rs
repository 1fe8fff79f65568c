//! Strongest-match strategy: the highest-scoring fully matching pair wins.
//!
//! Every field of every pair is scored. Ties go to the later pair. While no pair
//! has matched, the best-scoring miss is kept as the closest miss.

use super::cacheability::is_cachable;
use super::field::{FieldMatch, MatchField};
use super::strategy::{MatchingResult, MatchingStrategy, PairContext};
use crate::error::MatchError;
use crate::models::{ClosestMiss, RequestMatcherResponsePair};
use std::ops::ControlFlow;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct StrongestMatchAcc {
    matched: bool,
    score: u32,
    missed_fields: Vec<MatchField>,
    matched_on_all_but_headers: bool,
    matched_on_all_but_state: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StrongestMatchStrategy {
    matched_on_all_but_headers_at_least_once: bool,
    matched_on_all_but_state_at_least_once: bool,
    strongest_match_score: u32,
    closest_miss_score: u32,
    closest_miss: Option<ClosestMiss>,
    winner: Option<RequestMatcherResponsePair>,
}

impl StrongestMatchStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchingStrategy for StrongestMatchStrategy {
    type Acc = StrongestMatchAcc;

    fn pre_matching(&self) -> StrongestMatchAcc {
        StrongestMatchAcc {
            matched: true,
            score: 0,
            missed_fields: Vec::new(),
            matched_on_all_but_headers: true,
            matched_on_all_but_state: true,
        }
    }

    fn matching(
        &self,
        mut acc: StrongestMatchAcc,
        field_match: FieldMatch,
        field: MatchField,
    ) -> ControlFlow<StrongestMatchAcc, StrongestMatchAcc> {
        if !field_match.matched {
            if field != MatchField::Headers {
                acc.matched_on_all_but_headers = false;
            }
            if field != MatchField::State {
                acc.matched_on_all_but_state = false;
            }
            acc.matched = false;
            acc.missed_fields.push(field);
        }
        acc.score += field_match.score;
        ControlFlow::Continue(acc)
    }

    fn post_matching(
        mut self,
        acc: StrongestMatchAcc,
        ctx: PairContext<'_>,
    ) -> ControlFlow<MatchingResult, Self> {
        let matcher = &ctx.pair.matcher;

        // Only counts when the pair actually declares header/state requirements
        if acc.matched_on_all_but_headers && matcher.has_headers() {
            self.matched_on_all_but_headers_at_least_once = true;
        }
        if acc.matched_on_all_but_state && matcher.has_state() {
            self.matched_on_all_but_state_at_least_once = true;
        }

        if acc.matched && acc.score >= self.strongest_match_score {
            trace!("New strongest match with score {}", acc.score);
            self.winner = Some(ctx.pair.source.clone());
            self.strongest_match_score = acc.score;
            self.closest_miss = None;
        } else if !acc.matched && self.winner.is_none() && acc.score >= self.closest_miss_score {
            self.closest_miss_score = acc.score;
            self.closest_miss = Some(ClosestMiss {
                request: ctx.request.clone(),
                request_matcher: ctx.pair.source.request_matcher.clone(),
                response: ctx.pair.source.response.clone(),
                missed_fields: acc
                    .missed_fields
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect(),
                state: ctx.state.snapshot(),
            });
        }

        ControlFlow::Continue(self)
    }

    fn result(self) -> MatchingResult {
        let cachable = is_cachable(
            self.winner.as_ref().map(|pair| &pair.request_matcher),
            self.matched_on_all_but_headers_at_least_once,
            self.matched_on_all_but_state_at_least_once,
        );

        match self.winner {
            Some(pair) => MatchingResult::hit(pair, cachable),
            None => MatchingResult::miss(
                MatchError {
                    closest_miss: self.closest_miss.map(Box::new),
                    matched_on_all_but_headers_at_least_once: self
                        .matched_on_all_but_headers_at_least_once,
                    matched_on_all_but_state_at_least_once: self
                        .matched_on_all_but_state_at_least_once,
                },
                cachable,
            ),
        }
    }
}
