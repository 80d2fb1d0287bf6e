use super::*;
use proptest::prelude::*;

const FIRST: FallbackContext = FallbackContext {
    draft_len: 300,
    iteration: 1,
};

#[test]
fn test_parse_bare_json() {
    let text = r#"{"score": 8, "is_acceptable": true, "strengths": ["clear"], "weaknesses": [], "suggestions": [], "needs_search": false}"#;
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.source, EvaluationSource::EmbeddedObject);
    assert_eq!(parsed.record.score, 8);
    assert!(parsed.record.is_acceptable);
    assert_eq!(parsed.record.strengths, vec!["clear".to_string()]);
}

#[test]
fn test_parse_fenced_block_wins() {
    let text = "Here is my evaluation:\n```json\n{\"score\": 4, \"is_acceptable\": false, \"needs_search\": true}\n```\nand some {\"score\": 9, \"is_acceptable\": true} noise";
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.source, EvaluationSource::FencedBlock);
    assert_eq!(parsed.record.score, 4);
    assert!(!parsed.record.is_acceptable);
    assert!(parsed.record.needs_search);
}

#[test]
fn test_parse_untagged_fence() {
    let text = "```\n{\"score\": 6, \"is_acceptable\": false}\n```";
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.source, EvaluationSource::FencedBlock);
    assert_eq!(parsed.record.score, 6);
}

#[test]
fn test_parse_object_surrounded_by_prose() {
    let text = "Sure! {\"score\": 7, \"is_acceptable\": true, \"weaknesses\": [\"short\"]} Hope that helps.";
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.source, EvaluationSource::EmbeddedObject);
    assert_eq!(parsed.record.weaknesses, vec!["short".to_string()]);
}

#[test]
fn test_parse_object_with_one_nested_level() {
    let text = "Result: {\"score\": 5, \"is_acceptable\": false, \"meta\": {\"model\": \"x\"}} end";
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.source, EvaluationSource::EmbeddedObject);
    assert_eq!(parsed.record.score, 5);
}

#[test]
fn test_balanced_braces_inside_strings_count_as_nesting() {
    let text = r#"Verdict: {"score": 6, "is_acceptable": false, "weaknesses": ["use {} syntax"]} done"#;
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.source, EvaluationSource::EmbeddedObject);
    assert_eq!(parsed.record.weaknesses, vec!["use {} syntax".to_string()]);
}

#[test]
fn test_stray_brace_inside_string_needs_whole_text() {
    // The embedded match stops at the stray brace, so only a bare object parses.
    let bare = r#"{"score": 8, "is_acceptable": true, "weaknesses": ["stray } brace"]}"#;
    let parsed = parse_evaluation(bare, FIRST);
    assert_eq!(parsed.source, EvaluationSource::WholeText);
    assert_eq!(parsed.record.weaknesses, vec!["stray } brace".to_string()]);

    let with_prose = format!("Here you go: {}", bare);
    assert!(parse_evaluation(&with_prose, FIRST).is_fallback());
}

#[test]
fn test_fenced_block_missing_keys_falls_through_to_next_candidate() {
    let text = "```json\n{\"verdict\": \"good\"}\n```";
    let parsed = parse_evaluation(text, FIRST);
    assert!(parsed.is_fallback());
}

#[test]
fn test_missing_is_acceptable_uses_fallback() {
    let parsed = parse_evaluation(r#"{"score": 9}"#, FIRST);
    assert!(parsed.is_fallback());
}

#[test]
fn test_score_coercion() {
    let parsed = parse_evaluation(r#"{"score": "8", "is_acceptable": "true"}"#, FIRST);
    assert_eq!(parsed.record.score, 8);
    assert!(parsed.record.is_acceptable);

    let parsed = parse_evaluation(r#"{"score": 7.6, "is_acceptable": true}"#, FIRST);
    assert_eq!(parsed.record.score, 8);

    let parsed = parse_evaluation(r#"{"score": 42, "is_acceptable": true}"#, FIRST);
    assert_eq!(parsed.record.score, 10);

    let parsed = parse_evaluation(r#"{"score": 0, "is_acceptable": false}"#, FIRST);
    assert_eq!(parsed.record.score, 1);
}

#[test]
fn test_feedback_lists_truncated_to_three() {
    let text = r#"{"score": 3, "is_acceptable": false, "suggestions": ["a", "b", "c", "d", "e"]}"#;
    let parsed = parse_evaluation(text, FIRST);
    assert_eq!(parsed.record.suggestions.len(), 3);
}

#[test]
fn test_fallback_short_draft_first_iteration() {
    let parsed = parse_evaluation("I think the answer is fine.", FIRST);
    assert!(parsed.is_fallback());
    let record = parsed.record;
    assert_eq!(record.score, 5);
    assert!(!record.is_acceptable);
    assert_eq!(record.strengths, vec!["Answer provided".to_string()]);
    assert_eq!(record.weaknesses, vec!["Could be more detailed".to_string()]);
    assert_eq!(record.suggestions, vec!["Add more examples".to_string()]);
    assert!(!record.needs_search);
}

#[test]
fn test_fallback_second_iteration_accepts() {
    let context = FallbackContext {
        draft_len: 100,
        iteration: 2,
    };
    let record = parse_evaluation("not json", context).record;
    assert_eq!(record.score, 5);
    assert!(record.is_acceptable);
}

#[test]
fn test_fallback_long_draft_scores_high() {
    let context = FallbackContext {
        draft_len: 1500,
        iteration: 1,
    };
    let record = fallback_evaluation(context);
    assert_eq!(record.score, 7);
    assert!(record.is_acceptable);
    assert!(record.weaknesses.is_empty());
    assert!(record.suggestions.is_empty());
}

#[test]
fn test_fallback_score_capped_at_ten() {
    let context = FallbackContext {
        draft_len: 50_000,
        iteration: 1,
    };
    assert_eq!(fallback_evaluation(context).score, 10);
}

#[test]
fn test_empty_response_reason() {
    let parsed = parse_evaluation("   ", FIRST);
    assert_eq!(
        parsed.source,
        EvaluationSource::Fallback {
            reason: "Empty evaluation response".to_string()
        }
    );
}

#[test]
fn test_parse_is_deterministic() {
    let text = "garbage output {not json}";
    assert_eq!(parse_evaluation(text, FIRST), parse_evaluation(text, FIRST));
}

proptest! {
    #[test]
    fn prop_embedded_record_roundtrips(
        score in 1u8..=10,
        is_acceptable in any::<bool>(),
        prefix in "[a-zA-Z .,!?\n]{0,40}",
        suffix in "[a-zA-Z .,!?\n]{0,40}",
    ) {
        let text = format!(
            "{}{{\"score\": {}, \"is_acceptable\": {}, \"needs_search\": false}}{}",
            prefix, score, is_acceptable, suffix
        );
        let parsed = parse_evaluation(&text, FIRST);
        prop_assert!(!parsed.is_fallback());
        prop_assert_eq!(parsed.record.score, score);
        prop_assert_eq!(parsed.record.is_acceptable, is_acceptable);
    }

    #[test]
    fn prop_fallback_acceptance_rule(
        draft_len in 0usize..5000,
        iteration in 0u32..6,
        noise in "[a-zA-Z .,!?\n]{0,80}",
    ) {
        let context = FallbackContext { draft_len, iteration };
        let parsed = parse_evaluation(&noise, context);
        prop_assert!(parsed.is_fallback());
        let record = parsed.record;
        prop_assert!((5..=10).contains(&record.score));
        prop_assert_eq!(record.is_acceptable, iteration >= 2 || record.score >= 7);
    }
}
