pub mod evaluating;
pub mod evaluation_parser;
pub mod evaluation_schema;
pub mod finalizing;
pub mod generating;
pub mod reflecting;
pub mod searching;

pub use evaluating::run_evaluation_step;
pub use evaluation_schema::EvaluationRecord;
pub use finalizing::run_finalize_step;
pub use generating::run_generation_step;
pub use reflecting::run_reflection_step;
pub use searching::run_search_step;

use crate::agents::LanguageModel;
use crate::config::{SamplingConfig, SearchConfig};
use crate::search::SearchProvider;
use crate::state::StatePatch;
use crate::structured_logger::StructuredLogger;

/// Search request parameters passed to the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub max_results: usize,
    pub depth: String,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_results: config.max_results,
            depth: config.depth.clone(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

/// Collaborators and settings shared by every step of a run.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub model: &'a dyn LanguageModel,
    pub search: &'a dyn SearchProvider,
    pub sampling: SamplingConfig,
    pub search_settings: &'a SearchSettings,
    pub logger: Option<&'a StructuredLogger>,
}

/// Result of one step: the patch to merge plus whether the step degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub patch: StatePatch,
    /// True when the evaluation fell back to the heuristic or the search
    /// collaborator failed and the sentinel was used.
    pub degraded: bool,
}

impl StepOutput {
    pub fn ok(patch: StatePatch) -> Self {
        Self {
            patch,
            degraded: false,
        }
    }

    pub fn degraded(patch: StatePatch) -> Self {
        Self {
            patch,
            degraded: true,
        }
    }
}

/// First `max_chars` characters of `text`, for log previews.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
