//! Scans a simulation with a strategy.

use super::field::MatchField;
use super::first_match::FirstMatchStrategy;
use super::request_matcher::FIELD_ORDER;
use super::strategy::{MatchingResult, MatchingStrategy, PairContext, StrategyKind};
use super::strongest_match::StrongestMatchStrategy;
use crate::models::RequestDetails;
use crate::simulation::Simulation;
use crate::state::StateReader;
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// Run `strategy` over every pair of the simulation, in order.
///
/// In webserver mode the destination field is not evaluated at all.
pub fn run<S: MatchingStrategy>(
    mut strategy: S,
    request: &RequestDetails,
    webserver: bool,
    simulation: &Simulation,
    state: &dyn StateReader,
) -> MatchingResult {
    for (index, pair) in simulation.pairs().enumerate() {
        let mut acc = strategy.pre_matching();

        for field in FIELD_ORDER {
            if webserver && field == MatchField::Destination {
                continue;
            }
            let field_match = strategy.evaluate_field(pair, field, request, state);
            trace!(
                "Pair #{} field {}: matched={} score={}",
                index,
                field,
                field_match.matched,
                field_match.score
            );
            match strategy.matching(acc, field_match, field) {
                ControlFlow::Continue(next) => acc = next,
                ControlFlow::Break(done) => {
                    acc = done;
                    break;
                }
            }
        }

        let ctx = PairContext {
            request,
            pair,
            state,
        };
        match strategy.post_matching(acc, ctx) {
            ControlFlow::Break(result) => {
                debug!("Pair #{} ended the scan", index);
                return result;
            }
            ControlFlow::Continue(next) => strategy = next,
        }
    }

    strategy.result()
}

/// Run the strategy selected by `kind`.
pub fn match_request(
    kind: StrategyKind,
    request: &RequestDetails,
    webserver: bool,
    simulation: &Simulation,
    state: &dyn StateReader,
) -> MatchingResult {
    match kind {
        StrategyKind::First => run(
            FirstMatchStrategy::new(),
            request,
            webserver,
            simulation,
            state,
        ),
        StrategyKind::Strongest => run(
            StrongestMatchStrategy::new(),
            request,
            webserver,
            simulation,
            state,
        ),
    }
}
