use crate::phases::EvaluationRecord;
use serde::{Deserialize, Serialize};

/// The fixed set of steps the answer loop can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Generate,
    Search,
    Evaluate,
    Reflect,
    Finalize,
}

impl Step {
    /// Node name recorded in the session log.
    pub fn node_name(&self) -> &'static str {
        match self {
            Step::Generate => "generate_answer",
            Step::Search => "search",
            Step::Evaluate => "evaluate",
            Step::Reflect => "reflect",
            Step::Finalize => "finalize",
        }
    }

    /// Short label for console output.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Generate => "Generate",
            Step::Search => "Search",
            Step::Evaluate => "Evaluate",
            Step::Reflect => "Reflect",
            Step::Finalize => "Finalize",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Running state threaded through every step of one run.
///
/// `question` and `max_iterations` are fixed at construction. Steps never
/// write the struct directly; they return a [`StatePatch`] that is merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    question: String,
    pub draft_answer: Option<String>,
    pub evaluation: Option<EvaluationRecord>,
    pub final_answer: Option<String>,
    #[serde(default)]
    pub reflections: Vec<String>,
    pub search_results: Option<String>,
    iteration_count: u32,
    max_iterations: u32,
}

impl WorkflowState {
    pub fn new(question: &str, max_iterations: u32) -> Self {
        Self {
            question: question.to_string(),
            draft_answer: None,
            evaluation: None,
            final_answer: None,
            reflections: Vec::new(),
            search_results: None,
            iteration_count: 0,
            max_iterations,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// True when a search step has run, including one that degraded.
    pub fn has_search_results(&self) -> bool {
        self.search_results
            .as_deref()
            .is_some_and(|results| !results.is_empty())
    }

    pub fn draft_len(&self) -> usize {
        self.draft_answer
            .as_deref()
            .map(|draft| draft.chars().count())
            .unwrap_or(0)
    }

    /// Merges a step's patch into the state.
    ///
    /// Fields absent from the patch are left untouched. `iteration_count`
    /// only ever moves forward by the patch's increment.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(draft) = patch.draft_answer {
            self.draft_answer = Some(draft);
        }
        if let Some(evaluation) = patch.evaluation {
            self.evaluation = Some(evaluation);
        }
        if let Some(answer) = patch.final_answer {
            self.final_answer = Some(answer);
        }
        if let Some(reflections) = patch.reflections {
            self.reflections = reflections;
        }
        if let Some(results) = patch.search_results {
            self.search_results = Some(results);
        }
        self.iteration_count = self.iteration_count.saturating_add(patch.iteration_increment);
    }
}

/// Partial update returned by a step function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub draft_answer: Option<String>,
    pub evaluation: Option<EvaluationRecord>,
    pub final_answer: Option<String>,
    pub reflections: Option<Vec<String>>,
    pub search_results: Option<String>,
    pub iteration_increment: u32,
}

impl StatePatch {
    pub fn draft(draft: String) -> Self {
        Self {
            draft_answer: Some(draft),
            iteration_increment: 1,
            ..Self::default()
        }
    }

    pub fn evaluation(record: EvaluationRecord) -> Self {
        Self {
            evaluation: Some(record),
            ..Self::default()
        }
    }

    pub fn search_results(results: String) -> Self {
        Self {
            search_results: Some(results),
            ..Self::default()
        }
    }

    pub fn reflections(reflections: Vec<String>) -> Self {
        Self {
            reflections: Some(reflections),
            ..Self::default()
        }
    }

    pub fn final_answer(answer: String) -> Self {
        Self {
            final_answer: Some(answer),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
