//! The answer loop.
//!
//! `generate -> evaluate -> {search | reflect | finalize}`, with search and
//! reflect looping back to generate. Steps run one at a time; each is awaited
//! and its patch merged before the next step is chosen.

pub mod router;

use crate::errors::QaError;
use crate::phases::{
    run_evaluation_step, run_finalize_step, run_generation_step, run_reflection_step,
    run_search_step, StepContext, StepOutput,
};
use crate::state::{Step, WorkflowState};
use anyhow::Result;
use router::decide;

/// Receives the merged state after every executed step, before the next
/// transition is computed.
pub trait TransitionObserver: Send + Sync {
    fn on_transition(&self, step: Step, state: &WorkflowState);
}

/// What happened during a completed run besides the final state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Executed steps in order.
    pub steps: Vec<Step>,
    /// Evaluations that fell back to the length heuristic.
    pub evaluation_fallbacks: u32,
    /// A search ran and degraded to the unavailable sentinel.
    pub search_degraded: bool,
}

impl RunReport {
    pub fn node_trace(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::node_name).collect()
    }
}

pub struct Engine<'a> {
    ctx: StepContext<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(ctx: StepContext<'a>) -> Self {
        Self { ctx }
    }

    /// Runs the loop to completion for one question.
    ///
    /// Any model failure aborts the run and the partial state is dropped.
    /// Parse and search failures degrade inside their steps and never abort.
    pub async fn run(
        &self,
        question: &str,
        max_iterations: u32,
        observer: &dyn TransitionObserver,
    ) -> Result<(WorkflowState, RunReport)> {
        if max_iterations == 0 {
            return Err(QaError::configuration("max_iterations must be at least 1").into());
        }

        let mut state = WorkflowState::new(question, max_iterations);
        let mut report = RunReport::default();
        let mut step = Step::Generate;

        loop {
            tracing::debug!(
                "Starting step {} (iteration {})",
                step.node_name(),
                state.iteration_count()
            );
            if let Some(logger) = self.ctx.logger {
                logger.log_step_started(step, state.iteration_count());
            }

            let output = match self.execute(step, &state).await {
                Ok(output) => output,
                Err(err) => {
                    let message = format!("{:#}", err);
                    tracing::error!("Step {} failed: {}", step.node_name(), message);
                    if let Some(logger) = self.ctx.logger {
                        logger.log_run_failed(step, &message);
                    }
                    return Err(err);
                }
            };

            if output.degraded {
                match step {
                    Step::Evaluate => report.evaluation_fallbacks += 1,
                    Step::Search => report.search_degraded = true,
                    _ => {}
                }
            }

            state.apply(output.patch);
            report.steps.push(step);

            if let Some(logger) = self.ctx.logger {
                logger.log_step_completed(step, &state);
            }
            observer.on_transition(step, &state);

            step = match step {
                Step::Generate => Step::Evaluate,
                Step::Search | Step::Reflect => Step::Generate,
                Step::Evaluate => {
                    let decision = decide(&state);
                    tracing::info!(
                        "Routing to {}: {}",
                        decision.next.step().node_name(),
                        decision.reason.describe()
                    );
                    if let Some(logger) = self.ctx.logger {
                        logger.log_route_decision(&decision);
                    }
                    decision.next.step()
                }
                Step::Finalize => break,
            };
        }

        if let Some(logger) = self.ctx.logger {
            logger.log_run_completed(state.iteration_count(), report.steps.len());
        }
        tracing::info!(
            "Run completed after {} iteration(s), {} step(s)",
            state.iteration_count(),
            report.steps.len()
        );

        Ok((state, report))
    }

    async fn execute(&self, step: Step, state: &WorkflowState) -> Result<StepOutput> {
        match step {
            Step::Generate => run_generation_step(state, &self.ctx).await,
            Step::Search => Ok(run_search_step(state, &self.ctx).await),
            Step::Evaluate => run_evaluation_step(state, &self.ctx).await,
            Step::Reflect => Ok(run_reflection_step(state)),
            Step::Finalize => run_finalize_step(state, &self.ctx).await,
        }
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
