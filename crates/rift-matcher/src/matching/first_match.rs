//! First-match strategy: the first pair passing every gate wins.

use super::cacheability::is_cachable;
use super::field::{FieldMatch, MatchField};
use super::request_matcher::CompiledPair;
use super::strategy::{MatchingResult, MatchingStrategy, PairContext};
use crate::error::MatchError;
use crate::models::RequestDetails;
use crate::state::StateReader;
use std::ops::ControlFlow;
use tracing::trace;

/// Per-pair gates. Body, destination, scheme, path, query and method are hard
/// gates; headers and state are soft gates.
#[derive(Debug, Clone, Copy)]
pub struct FirstMatchAcc {
    hard_gates: bool,
    headers: bool,
    state: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FirstMatchStrategy {
    matched_on_all_but_headers_at_least_once: bool,
    matched_on_all_but_state_at_least_once: bool,
}

impl FirstMatchStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchingStrategy for FirstMatchStrategy {
    type Acc = FirstMatchAcc;

    fn pre_matching(&self) -> FirstMatchAcc {
        FirstMatchAcc {
            hard_gates: true,
            headers: true,
            state: true,
        }
    }

    fn evaluate_field(
        &self,
        pair: &CompiledPair,
        field: MatchField,
        request: &RequestDetails,
        state: &dyn StateReader,
    ) -> FieldMatch {
        match field {
            MatchField::Headers => FieldMatch::new(pair.matcher.headers_match(request), 0),
            _ => pair.matcher.evaluate_field(field, request, state),
        }
    }

    fn matching(
        &self,
        mut acc: FirstMatchAcc,
        field_match: FieldMatch,
        field: MatchField,
    ) -> ControlFlow<FirstMatchAcc, FirstMatchAcc> {
        match field {
            MatchField::Headers => acc.headers = field_match.matched,
            MatchField::State => acc.state = field_match.matched,
            _ if !field_match.matched => {
                trace!("Hard gate {} failed", field);
                acc.hard_gates = false;
                return ControlFlow::Break(acc);
            }
            _ => {}
        }
        ControlFlow::Continue(acc)
    }

    fn post_matching(
        mut self,
        acc: FirstMatchAcc,
        ctx: PairContext<'_>,
    ) -> ControlFlow<MatchingResult, Self> {
        if !acc.hard_gates {
            return ControlFlow::Continue(self);
        }

        let matcher = &ctx.pair.matcher;
        if acc.headers && acc.state {
            let cachable = is_cachable(
                Some(&ctx.pair.source.request_matcher),
                self.matched_on_all_but_headers_at_least_once,
                self.matched_on_all_but_state_at_least_once,
            );
            return ControlFlow::Break(MatchingResult::hit(ctx.pair.source.clone(), cachable));
        }

        if !acc.headers && acc.state && matcher.has_headers() {
            self.matched_on_all_but_headers_at_least_once = true;
        }
        if acc.headers && !acc.state && matcher.has_state() {
            self.matched_on_all_but_state_at_least_once = true;
        }
        ControlFlow::Continue(self)
    }

    fn result(self) -> MatchingResult {
        let cachable = is_cachable(
            None,
            self.matched_on_all_but_headers_at_least_once,
            self.matched_on_all_but_state_at_least_once,
        );
        MatchingResult::miss(
            MatchError {
                closest_miss: None,
                matched_on_all_but_headers_at_least_once: self
                    .matched_on_all_but_headers_at_least_once,
                matched_on_all_but_state_at_least_once: self
                    .matched_on_all_but_state_at_least_once,
            },
            cachable,
        )
    }
}
