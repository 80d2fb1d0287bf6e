use crate::errors::QaError;
use crate::phases::{StepContext, StepOutput};
use crate::state::{StatePatch, Step, WorkflowState};
use anyhow::Result;

/// Generates a draft at the creative temperature and counts one iteration.
pub async fn run_generation_step(state: &WorkflowState, ctx: &StepContext<'_>) -> Result<StepOutput> {
    let prompt = build_generation_prompt(state);

    let draft = ctx
        .model
        .invoke(&prompt, ctx.sampling.creative)
        .await
        .map_err(|e| QaError::model(Step::Generate, format!("{:#}", e)))?;

    tracing::info!(
        "Generated draft ({} chars) for iteration {}",
        draft.chars().count(),
        state.iteration_count() + 1
    );

    Ok(StepOutput::ok(StatePatch::draft(draft)))
}

/// Builds the answer prompt from the question, any search results and all
/// prior reflections.
pub fn build_generation_prompt(state: &WorkflowState) -> String {
    let context = match state.search_results.as_deref() {
        Some(results) if !results.is_empty() => {
            format!("\n\nSearch Results:\n{}\n\n", results)
        }
        _ => String::new(),
    };

    let reflection_context = if state.reflections.is_empty() {
        String::new()
    } else {
        let bullets: Vec<String> = state
            .reflections
            .iter()
            .map(|r| format!("- {}", r))
            .collect();
        format!("\n\nPrevious Reflections:\n{}", bullets.join("\n"))
    };

    format!(
        r#"Provide a detailed, accurate answer to this question:{}{}
Question: {}

Answer:"#,
        context,
        reflection_context,
        state.question()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_first_iteration() {
        let state = WorkflowState::new("What is 2+2?", 2);
        let prompt = build_generation_prompt(&state);
        assert_eq!(
            prompt,
            "Provide a detailed, accurate answer to this question:\nQuestion: What is 2+2?\n\nAnswer:"
        );
    }

    #[test]
    fn test_prompt_includes_search_and_reflections() {
        let mut state = WorkflowState::new("Who won?", 3);
        state.apply(StatePatch::search_results(
            "1. The home team won.\nSource: https://news.example".to_string(),
        ));
        state.apply(StatePatch::reflections(vec![
            "Iteration 1: Address: vague.".to_string(),
            "Iteration 2: Improve: cite sources".to_string(),
        ]));

        let prompt = build_generation_prompt(&state);
        assert!(prompt.contains("Search Results:\n1. The home team won."));
        assert!(prompt.contains("Previous Reflections:\n- Iteration 1: Address: vague.\n- Iteration 2"));
        assert!(prompt.ends_with("Question: Who won?\n\nAnswer:"));
    }
}
