use crate::phases::{EvaluationRecord, StepOutput};
use crate::state::{StatePatch, WorkflowState};

/// Appends a critique of the last evaluation to the reflections.
///
/// No model call; the existing reflections are kept and one entry is added.
pub fn run_reflection_step(state: &WorkflowState) -> StepOutput {
    let reflection = build_reflection(state.evaluation.as_ref(), state.iteration_count());
    tracing::info!("Added reflection: {}", reflection);

    let mut reflections = state.reflections.clone();
    reflections.push(reflection);
    StepOutput::ok(StatePatch::reflections(reflections))
}

pub fn build_reflection(evaluation: Option<&EvaluationRecord>, iteration: u32) -> String {
    let critique = match evaluation.filter(|e| e.has_feedback()) {
        Some(evaluation) => {
            let mut parts = Vec::new();
            if !evaluation.weaknesses.is_empty() {
                parts.push(format!("Address: {}.", evaluation.weaknesses.join(", ")));
            }
            if !evaluation.suggestions.is_empty() {
                parts.push(format!("Improve: {}", evaluation.suggestions.join(", ")));
            }
            parts.join(" ")
        }
        None => "Continue improving clarity and completeness".to_string(),
    };

    format!("Iteration {}: {}", iteration, critique)
}
