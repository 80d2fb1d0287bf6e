use crate::errors::QaError;
use crate::phases::{StepContext, StepOutput};
use crate::state::{StatePatch, Step, WorkflowState};
use anyhow::Result;

/// Polishes the current draft into the final answer.
pub async fn run_finalize_step(state: &WorkflowState, ctx: &StepContext<'_>) -> Result<StepOutput> {
    let prompt = build_finalize_prompt(state);

    let answer = ctx
        .model
        .invoke(&prompt, ctx.sampling.polish)
        .await
        .map_err(|e| QaError::model(Step::Finalize, format!("{:#}", e)))?;

    tracing::info!("Finalized answer ({} chars)", answer.chars().count());
    Ok(StepOutput::ok(StatePatch::final_answer(answer)))
}

pub fn build_finalize_prompt(state: &WorkflowState) -> String {
    format!(
        r#"Polish this answer for final presentation. Make it clear, concise, and well-structured.

Question: {}

Draft Answer: {}

Provide the final polished answer:"#,
        state.question(),
        state.draft_answer.as_deref().unwrap_or_default()
    )
}
