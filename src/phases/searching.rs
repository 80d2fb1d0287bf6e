use crate::phases::{StepContext, StepOutput};
use crate::search::SearchHit;
use crate::state::{StatePatch, WorkflowState};

/// Value stored in `search_results` when the search collaborator fails.
pub const SEARCH_UNAVAILABLE: &str = "Search unavailable";

/// Searches the web for the bare question.
///
/// Never fails: collaborator errors and empty result sets degrade to
/// [`SEARCH_UNAVAILABLE`].
pub async fn run_search_step(state: &WorkflowState, ctx: &StepContext<'_>) -> StepOutput {
    let settings = ctx.search_settings;
    tracing::info!("Searching for: {}", state.question());

    let failure = match ctx
        .search
        .search(state.question(), settings.max_results, &settings.depth)
        .await
    {
        Ok(hits) if !hits.is_empty() => {
            tracing::info!("Found {} search results", hits.len());
            return StepOutput::ok(StatePatch::search_results(format_search_results(&hits)));
        }
        Ok(_) => "search returned no results".to_string(),
        Err(e) => format!("{:#}", e),
    };

    tracing::warn!("Search failed: {}", failure);
    if let Some(logger) = ctx.logger {
        logger.log_search_degraded(&failure);
    }
    StepOutput::degraded(StatePatch::search_results(SEARCH_UNAVAILABLE.to_string()))
}

/// Renders hits as numbered blocks of content followed by the source URL.
pub fn format_search_results(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(idx, hit)| format!("{}. {}\nSource: {}", idx + 1, hit.content, hit.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}
