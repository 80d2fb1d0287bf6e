use super::*;
use crate::phases::EvaluationRecord;
use crate::state::StatePatch;
use proptest::prelude::*;

fn record(score: u8, is_acceptable: bool, needs_search: bool) -> EvaluationRecord {
    EvaluationRecord {
        score,
        is_acceptable,
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        suggestions: Vec::new(),
        needs_search,
    }
}

/// State after `iterations` generate steps and one evaluation.
fn evaluated_state(max: u32, iterations: u32, evaluation: EvaluationRecord) -> WorkflowState {
    let mut state = WorkflowState::new("question", max);
    for i in 0..iterations {
        state.apply(StatePatch::draft(format!("draft {}", i)));
    }
    state.apply(StatePatch::evaluation(evaluation));
    state
}

#[test]
fn test_iteration_limit_finalizes_even_when_unacceptable() {
    let state = evaluated_state(3, 3, record(2, false, true));
    let decision = decide(&state);
    assert_eq!(decision.next, Route::Finalize);
    assert_eq!(decision.reason, RouteReason::IterationLimit);
}

#[test]
fn test_acceptable_answer_finalizes() {
    let state = evaluated_state(3, 1, record(9, true, false));
    assert_eq!(decide(&state).reason, RouteReason::Accepted);
    assert_eq!(decide(&state).next, Route::Finalize);
}

#[test]
fn test_acceptable_flag_with_low_score_does_not_finalize() {
    let state = evaluated_state(3, 1, record(6, true, false));
    assert_eq!(decide(&state).next, Route::Reflect);
}

#[test]
fn test_high_score_without_acceptance_does_not_finalize() {
    let state = evaluated_state(3, 1, record(8, false, false));
    assert_eq!(decide(&state).next, Route::Reflect);
}

#[test]
fn test_search_requested_when_unset() {
    let state = evaluated_state(3, 1, record(4, false, true));
    let decision = decide(&state);
    assert_eq!(decision.next, Route::Search);
    assert_eq!(decision.reason, RouteReason::SearchRequested);
}

#[test]
fn test_search_not_repeated_after_success() {
    let mut state = evaluated_state(3, 2, record(4, false, true));
    state.apply(StatePatch::search_results(
        "1. content\nSource: https://example.com".to_string(),
    ));
    assert_eq!(decide(&state).next, Route::Reflect);
}

/// A degraded search still blocks a retry; this pins the existing policy.
#[test]
fn test_failed_search_sentinel_blocks_retry() {
    let mut state = evaluated_state(5, 2, record(3, false, true));
    state.apply(StatePatch::search_results("Search unavailable".to_string()));
    assert_eq!(decide(&state).next, Route::Reflect);
}

#[test]
fn test_missing_evaluation_reflects() {
    let mut state = WorkflowState::new("question", 3);
    state.apply(StatePatch::draft("draft".to_string()));
    assert_eq!(decide(&state).next, Route::Reflect);
}

#[test]
fn test_route_maps_to_step() {
    assert_eq!(Route::Search.step(), Step::Search);
    assert_eq!(Route::Reflect.step(), Step::Reflect);
    assert_eq!(Route::Finalize.step(), Step::Finalize);
}

proptest! {
    #[test]
    fn prop_iteration_bound_dominates(
        max in 1u32..6,
        extra in 0u32..3,
        score in 1u8..=10,
        is_acceptable in any::<bool>(),
        needs_search in any::<bool>(),
    ) {
        let state = evaluated_state(max, max + extra, record(score, is_acceptable, needs_search));
        prop_assert_eq!(decide(&state).next, Route::Finalize);
    }

    #[test]
    fn prop_route_is_pure(
        score in 1u8..=10,
        is_acceptable in any::<bool>(),
        needs_search in any::<bool>(),
        searched in any::<bool>(),
    ) {
        let mut state = evaluated_state(4, 1, record(score, is_acceptable, needs_search));
        if searched {
            state.apply(StatePatch::search_results("Search unavailable".to_string()));
        }
        let first = decide(&state);
        prop_assert_eq!(first, decide(&state));
        if first.next == Route::Search {
            prop_assert!(!searched && needs_search);
        }
    }
}
