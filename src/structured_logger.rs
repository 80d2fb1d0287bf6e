//! Structured JSONL logger for run reconstruction.
//!
//! Every line carries a monotonic sequence number, a microsecond UTC
//! timestamp, the session id and the emitting component. Write failures are
//! swallowed; logging never changes the outcome of a run.

use crate::state::{Step, WorkflowState};
use crate::workflow::router::RouteDecision;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct StructuredLogger {
    session_id: String,
    seq: AtomicU64,
    log_file: Mutex<File>,
    log_path: PathBuf,
}

/// A single log entry in JSONL format.
#[derive(Serialize, serde::Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number
    pub seq: u64,
    /// ISO 8601 timestamp with microseconds
    pub ts: String,
    pub session_id: String,
    /// Component that emitted the log
    pub component: String,
    /// Structured event data
    pub event: Value,
}

impl StructuredLogger {
    /// Creates a logger writing to `<logs_dir>/events.jsonl`.
    pub fn new(session_id: &str, logs_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(logs_dir)?;
        let log_path = logs_dir.join("events.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            session_id: session_id.to_string(),
            seq: AtomicU64::new(0),
            log_file: Mutex::new(file),
            log_path,
        })
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Logs a structured event as a single line.
    pub fn log(&self, component: &str, event: impl Serialize) {
        let entry = LogEntry {
            seq: self.next_seq(),
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            session_id: self.session_id.clone(),
            component: component.to_string(),
            event: serde_json::to_value(event).unwrap_or(Value::Null),
        };

        if let Ok(mut file) = self.log_file.lock() {
            if let Ok(line) = serde_json::to_string(&entry) {
                let _ = writeln!(file, "{}", line);
                let _ = file.flush();
            }
        }
    }

    pub fn log_step_started(&self, step: Step, iteration: u32) {
        self.log(
            "Engine",
            serde_json::json!({
                "type": "StepStarted",
                "step": step,
                "iteration": iteration
            }),
        );
    }

    pub fn log_step_completed(&self, step: Step, state: &WorkflowState) {
        self.log(
            "Engine",
            serde_json::json!({
                "type": "StepCompleted",
                "step": step,
                "iteration": state.iteration_count(),
                "evaluation_score": state.evaluation.as_ref().map(|e| e.score),
                "reflection_count": state.reflections.len()
            }),
        );
    }

    pub fn log_route_decision(&self, decision: &RouteDecision) {
        self.log(
            "Router",
            serde_json::json!({
                "type": "RouteDecision",
                "next": decision.next,
                "reason": decision.reason
            }),
        );
    }

    pub fn log_evaluation_fallback(&self, reason: &str, iteration: u32, preview: &str) {
        self.log(
            "Evaluate",
            serde_json::json!({
                "type": "EvaluationFallback",
                "reason": reason,
                "iteration": iteration,
                "response_preview": preview
            }),
        );
    }

    pub fn log_search_degraded(&self, error: &str) {
        self.log(
            "Search",
            serde_json::json!({
                "type": "SearchDegraded",
                "error": error
            }),
        );
    }

    pub fn log_run_completed(&self, iterations: u32, steps: usize) {
        self.log(
            "Engine",
            serde_json::json!({
                "type": "RunCompleted",
                "iterations": iterations,
                "steps": steps
            }),
        );
    }

    pub fn log_run_failed(&self, step: Step, error: &str) {
        self.log(
            "Engine",
            serde_json::json!({
                "type": "RunFailed",
                "step": step,
                "error": error
            }),
        );
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
#[path = "tests/structured_logger_tests.rs"]
mod tests;
