//! Routing policy applied after every evaluation.
//!
//! Rules, first match wins:
//! 1. iteration budget spent -> finalize
//! 2. evaluation acceptable with score >= 7 -> finalize
//! 3. evaluation asks for search and none has run yet -> search
//! 4. otherwise -> reflect
//!
//! Rule 3 only fires while `search_results` is empty. The unavailable
//! sentinel counts as a result, so a degraded search is never retried.

use crate::state::{Step, WorkflowState};
use serde::{Deserialize, Serialize};

/// The steps that can follow an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Search,
    Reflect,
    Finalize,
}

impl Route {
    pub fn step(self) -> Step {
        match self {
            Route::Search => Step::Search,
            Route::Reflect => Step::Reflect,
            Route::Finalize => Step::Finalize,
        }
    }
}

/// Which rule produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    IterationLimit,
    Accepted,
    SearchRequested,
    NeedsImprovement,
}

impl RouteReason {
    pub fn describe(&self) -> &'static str {
        match self {
            RouteReason::IterationLimit => "Max iterations reached",
            RouteReason::Accepted => "Answer acceptable",
            RouteReason::SearchRequested => "Search needed",
            RouteReason::NeedsImprovement => "Needs improvement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub next: Route,
    pub reason: RouteReason,
}

/// Decides the step after an evaluation, with the rule that fired.
///
/// Total over all states: a missing evaluation counts as unacceptable with
/// no search request.
pub fn decide(state: &WorkflowState) -> RouteDecision {
    let (next, reason) = if state.iteration_count() >= state.max_iterations() {
        (Route::Finalize, RouteReason::IterationLimit)
    } else if state.evaluation.as_ref().is_some_and(|e| e.passes()) {
        (Route::Finalize, RouteReason::Accepted)
    } else if state.evaluation.as_ref().is_some_and(|e| e.needs_search)
        && !state.has_search_results()
    {
        (Route::Search, RouteReason::SearchRequested)
    } else {
        (Route::Reflect, RouteReason::NeedsImprovement)
    };

    RouteDecision { next, reason }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
