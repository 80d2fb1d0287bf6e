use crate::errors::QaError;
use crate::phases::evaluation_parser::{parse_evaluation, EvaluationSource, FallbackContext};
use crate::phases::{preview, StepContext, StepOutput};
use crate::state::{StatePatch, Step, WorkflowState};
use anyhow::Result;

/// Scores the current draft at the deterministic temperature.
///
/// A model failure is fatal; an unparseable response is not, it degrades to
/// the fallback record.
pub async fn run_evaluation_step(state: &WorkflowState, ctx: &StepContext<'_>) -> Result<StepOutput> {
    let prompt = build_evaluation_prompt(state);

    let response = ctx
        .model
        .invoke(&prompt, ctx.sampling.deterministic)
        .await
        .map_err(|e| QaError::model(Step::Evaluate, format!("{:#}", e)))?;

    let context = FallbackContext {
        draft_len: state.draft_len(),
        iteration: state.iteration_count(),
    };
    let parsed = parse_evaluation(&response, context);

    if let EvaluationSource::Fallback { reason } = &parsed.source {
        let response_preview = preview(&response, 200);
        tracing::warn!("Could not parse evaluation JSON, using fallback evaluation: {}", reason);
        tracing::debug!("Raw evaluation response preview: {}", response_preview);
        if let Some(logger) = ctx.logger {
            logger.log_evaluation_fallback(reason, state.iteration_count(), &response_preview);
        }
    }

    tracing::info!(
        "Evaluation score: {}/10 (acceptable: {}, needs search: {})",
        parsed.record.score,
        parsed.record.is_acceptable,
        parsed.record.needs_search
    );

    let degraded = parsed.is_fallback();
    let patch = StatePatch::evaluation(parsed.record);
    Ok(if degraded {
        StepOutput::degraded(patch)
    } else {
        StepOutput::ok(patch)
    })
}

pub fn build_evaluation_prompt(state: &WorkflowState) -> String {
    format!(
        r#"You must respond with ONLY a JSON object, no other text.

Question: {}

Answer to evaluate: {}

Respond with this exact JSON structure:
{{
    "score": 8,
    "is_acceptable": true,
    "strengths": ["clear explanation", "good examples"],
    "weaknesses": ["could add more detail"],
    "suggestions": ["add code examples"],
    "needs_search": false
}}

Rules:
- score: number from 1-10
- is_acceptable: true if score >= 7, false otherwise
- strengths: list of 1-3 good points
- weaknesses: list of 1-3 weak points (empty list if none)
- suggestions: list of 1-3 improvements (empty list if none)
- needs_search: true only if answer lacks current information

Return ONLY the JSON object, nothing else:"#,
        state.question(),
        state.draft_answer.as_deref().unwrap_or_default()
    )
}
