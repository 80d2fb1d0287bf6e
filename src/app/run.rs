use crate::agents::{LanguageModel, ModelClient};
use crate::app::util::{rule, truncate_for_display};
use crate::config::QaConfig;
use crate::errors::QaError;
use crate::phases::{SearchSettings, StepContext};
use crate::qa_paths;
use crate::search::{SearchClient, SearchProvider};
use crate::session_store::{render_summary, JsonFileSessionStore, SessionRecorder, SessionStore};
use crate::state::{Step, WorkflowState};
use crate::structured_logger::StructuredLogger;
use crate::workflow::{Engine, RunReport, TransitionObserver};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Question used when the menu prompt is left empty.
pub const DEFAULT_QUESTION: &str = "What are the benefits of renewable energy?";

const QUESTION_PREVIEW_CHARS: usize = 60;

/// Collaborators built once per process from the resolved config.
pub struct Runtime {
    pub config: QaConfig,
    pub model: Box<dyn LanguageModel>,
    pub search: Box<dyn SearchProvider>,
    pub store: JsonFileSessionStore,
    search_enabled: bool,
    /// Parent of the per-session event log directories; `None` means `~/.qa-agent/logs`.
    logs_root: Option<PathBuf>,
}

impl Runtime {
    pub fn new(config: QaConfig, store: JsonFileSessionStore) -> Result<Self> {
        let model = ModelClient::from_config(&config)?;
        let search = SearchClient::from_config(&config);
        let search_enabled = search.is_enabled();
        Ok(Self {
            config,
            model: Box::new(model),
            search: Box::new(search),
            store,
            search_enabled,
            logs_root: None,
        })
    }

    /// Prints the provider and search status banner.
    pub fn announce(&self) {
        println!("\n{}", rule());
        println!("Iterative Q&A Assistant");
        println!("{}", rule());
        println!(
            "Using {} with model: {}",
            self.config.provider.as_str(),
            self.model.name()
        );
        if self.search_enabled {
            println!("Web search enabled");
        } else if self.config.search.enabled {
            println!("Web search disabled (no TAVILY_API_KEY)");
        } else {
            println!("Web search disabled");
        }
    }
}

/// Prints each executed node, then records the transition.
struct ProgressObserver<'a> {
    recorder: SessionRecorder<'a>,
}

impl TransitionObserver for ProgressObserver<'_> {
    fn on_transition(&self, step: Step, state: &WorkflowState) {
        println!("Executed: {}", step.node_name());
        self.recorder.on_transition(step, state);
    }
}

/// Runs one question end to end: session, engine, final save, summary, export.
///
/// Persistence failures after the run are reported and do not fail the call.
pub async fn run_qa_workflow(
    runtime: &Runtime,
    question: &str,
    max_iterations: u32,
) -> Result<(WorkflowState, RunReport)> {
    if max_iterations == 0 {
        return Err(QaError::configuration("max_iterations must be at least 1").into());
    }
    let session_id = runtime.store.create(question)?;

    println!("\n{}", rule());
    println!("STARTING QA WORKFLOW");
    println!("{}", rule());
    println!("Question: {}", question);
    println!("Max Iterations: {}", max_iterations);
    println!("Session ID: {}", session_id);
    println!("{}\n", rule());

    let logger = match session_logs_dir(runtime, &session_id)
        .and_then(|dir| StructuredLogger::new(&session_id, &dir))
    {
        Ok(logger) => Some(logger),
        Err(e) => {
            tracing::warn!("Structured logging disabled: {:#}", e);
            None
        }
    };

    let settings = SearchSettings::from(&runtime.config.search);
    let engine = Engine::new(StepContext {
        model: runtime.model.as_ref(),
        search: runtime.search.as_ref(),
        sampling: runtime.config.sampling,
        search_settings: &settings,
        logger: logger.as_ref(),
    });
    let observer = ProgressObserver {
        recorder: SessionRecorder::new(&runtime.store, &session_id),
    };

    let (state, report) = engine.run(question, max_iterations, &observer).await?;
    tracing::info!("Transition trace: {}", report.node_trace().join(" -> "));

    println!("\n{}", rule());
    println!("WORKFLOW COMPLETED");
    println!("{}", rule());

    if let Some(answer) = state.final_answer.as_deref() {
        match runtime.store.finalize(&session_id, answer, &state) {
            Ok(()) => println!("Saved final answer to session: {}", session_id),
            Err(e) => tracing::warn!("Failed to save final answer: {:#}", e),
        }
    }

    print_final_answer(&state, &report);

    match runtime.store.get(&session_id) {
        Ok(session) => println!("\n{}\n", render_summary(&session)),
        Err(e) => tracing::warn!("Failed to load session summary: {:#}", e),
    }
    match runtime.store.export(&session_id) {
        Ok(path) => println!("Exported session to: {}", path.display()),
        Err(e) => tracing::warn!("Failed to export session: {:#}", e),
    }
    if let Some(logger) = &logger {
        tracing::debug!("Event log: {}", logger.path().display());
    }

    Ok((state, report))
}

fn session_logs_dir(runtime: &Runtime, session_id: &str) -> Result<PathBuf> {
    match &runtime.logs_root {
        Some(root) => {
            let dir = root.join(session_id);
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
            Ok(dir)
        }
        None => qa_paths::session_logs_dir(session_id),
    }
}

fn print_final_answer(state: &WorkflowState, report: &RunReport) {
    println!("\n{}", rule());
    println!("FINAL ANSWER");
    println!("{}", rule());
    println!(
        "{}",
        state.final_answer.as_deref().unwrap_or("No answer generated")
    );
    println!("{}", rule());

    println!("\nWorkflow Statistics:");
    println!("   - Total Iterations: {}", state.iteration_count());
    println!("   - Reflections Generated: {}", state.reflections.len());
    println!(
        "   - Search Used: {}",
        if state.has_search_results() { "Yes" } else { "No" }
    );
    if report.search_degraded {
        println!("   - Search Results: unavailable");
    }
    if let Some(evaluation) = &state.evaluation {
        println!("   - Final Score: {}/10", evaluation.score);
    }
    if report.evaluation_fallbacks > 0 {
        println!(
            "   - Heuristic Evaluations: {}",
            report.evaluation_fallbacks
        );
    }
}

pub fn print_recent_sessions(store: &dyn SessionStore, limit: usize) -> Result<()> {
    let sessions = store.list_recent(limit)?;
    if sessions.is_empty() {
        println!("\nNo sessions found");
        return Ok(());
    }

    println!("\nRecent Sessions:");
    println!("{}", rule());
    for (i, session) in sessions.iter().enumerate() {
        println!("{}. [{}]", i + 1, session.session_id);
        println!(
            "   Q: {}",
            truncate_for_display(&session.question, QUESTION_PREVIEW_CHARS)
        );
        println!("   Iterations: {}", session.metadata.total_iterations);
        println!();
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/run_tests.rs"]
mod tests;
