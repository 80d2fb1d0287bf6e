//! Persistent record of every run.
//!
//! All sessions live in one JSON collection, `<memory_dir>/sessions.json`:
//!
//! ```json
//! {"sessions": [{"session_id": "...", "timestamp": "...", "question": "...",
//!                "states": [...], "final_answer": null, "metadata": {...}}]}
//! ```
//!
//! Every write reads the whole collection, updates one session and writes the
//! whole collection back through a temp file and rename. Writers inside this
//! process are serialised by an exclusive lock on `sessions.lock`; a writer
//! that bypasses the lock can still lose updates.

use crate::errors::QaError;
use crate::phases::EvaluationRecord;
use crate::state::{Step, WorkflowState};
use crate::workflow::TransitionObserver;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const SESSIONS_FILE: &str = "sessions.json";
const LOCK_FILE: &str = "sessions.lock";
const SESSION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const SUMMARY_ANSWER_CHARS: usize = 200;
const RULE_WIDTH: usize = 60;

/// Flags describing the state right after one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub has_draft: bool,
    pub has_evaluation: bool,
    pub has_search: bool,
    pub reflection_count: usize,
    pub evaluation_score: Option<u8>,
}

impl StateSnapshot {
    pub fn of(state: &WorkflowState) -> Self {
        Self {
            has_draft: state.draft_answer.as_deref().is_some_and(|d| !d.is_empty()),
            has_evaluation: state.evaluation.is_some(),
            has_search: state.has_search_results(),
            reflection_count: state.reflections.len(),
            evaluation_score: state.evaluation.as_ref().map(|e| e.score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLogEntry {
    pub timestamp: String,
    /// Node name of the step that produced this state.
    pub node: String,
    pub iteration: u32,
    pub state_snapshot: StateSnapshot,
}

/// Rolling totals, refreshed on every appended state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMetadata {
    pub total_iterations: u32,
    pub search_used: bool,
    pub reflection_count: usize,
}

/// Snapshot of the final state, written once when the run finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteState {
    pub question: String,
    pub final_answer: Option<String>,
    pub iterations: u32,
    pub reflections: Vec<String>,
    pub evaluation: Option<EvaluationRecord>,
}

impl CompleteState {
    pub fn of(state: &WorkflowState) -> Self {
        Self {
            question: state.question().to_string(),
            final_answer: state.final_answer.clone(),
            iterations: state.iteration_count(),
            reflections: state.reflections.clone(),
            evaluation: state.evaluation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub states: Vec<StateLogEntry>,
    #[serde(default)]
    pub final_answer: Option<String>,
    #[serde(default)]
    pub metadata: SessionMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_state: Option<CompleteState>,
}

impl Session {
    fn new(session_id: String, question: &str, created: DateTime<Local>) -> Self {
        Self {
            session_id,
            timestamp: created.format(TIMESTAMP_FORMAT).to_string(),
            question: question.to_string(),
            states: Vec::new(),
            final_answer: None,
            metadata: SessionMetadata::default(),
            complete_state: None,
        }
    }

    /// Placeholder for an id that is missing from the collection.
    fn minimal(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp: String::new(),
            question: String::new(),
            states: Vec::new(),
            final_answer: None,
            metadata: SessionMetadata::default(),
            complete_state: None,
        }
    }

    fn record(&mut self, step: Step, state: &WorkflowState, at: DateTime<Local>) {
        self.states.push(StateLogEntry {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            node: step.node_name().to_string(),
            iteration: state.iteration_count(),
            state_snapshot: StateSnapshot::of(state),
        });
        self.metadata = SessionMetadata {
            total_iterations: state.iteration_count(),
            search_used: state.has_search_results(),
            reflection_count: state.reflections.len(),
        };
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionCollection {
    #[serde(default)]
    sessions: Vec<Session>,
}

impl SessionCollection {
    /// Replaces the session with the same id, or appends it.
    fn upsert(&mut self, session: Session) {
        match self
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session.session_id)
        {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
    }

    fn entry(&mut self, session_id: &str) -> &mut Session {
        let index = match self
            .sessions
            .iter()
            .position(|s| s.session_id == session_id)
        {
            Some(index) => index,
            None => {
                tracing::warn!("Session {} not found, recreating it", session_id);
                self.sessions.push(Session::minimal(session_id));
                self.sessions.len() - 1
            }
        };
        &mut self.sessions[index]
    }
}

/// Storage for session records.
pub trait SessionStore: Send + Sync {
    /// Starts a session for `question` and returns its id.
    fn create(&self, question: &str) -> Result<String>;

    /// Records the state produced by `step`.
    fn append(&self, session_id: &str, step: Step, state: &WorkflowState) -> Result<()>;

    /// Writes the final answer and the complete-state snapshot.
    fn finalize(&self, session_id: &str, answer: &str, state: &WorkflowState) -> Result<()>;

    /// Most recent sessions first.
    fn list_recent(&self, limit: usize) -> Result<Vec<Session>>;

    fn get(&self, session_id: &str) -> Result<Session>;

    /// Writes one session to its own file and returns the file's path.
    fn export(&self, session_id: &str) -> Result<PathBuf>;
}

/// [`SessionStore`] over a single JSON file.
pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create memory directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.dir.join(SESSIONS_FILE)
    }

    pub fn export_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("session_{}.json", session_id))
    }

    /// Creates a session whose id and timestamp come from `created`.
    ///
    /// A session that already has the derived id is overwritten.
    pub fn create_at(&self, question: &str, created: DateTime<Local>) -> Result<String> {
        let session_id = created.format(SESSION_ID_FORMAT).to_string();
        let session = Session::new(session_id.clone(), question, created);
        self.locked(|| {
            let mut collection = self.read_collection()?;
            collection.upsert(session);
            self.write_collection(&collection)
        })?;
        Ok(session_id)
    }

    fn update(&self, session_id: &str, apply: impl FnOnce(&mut Session)) -> Result<()> {
        self.locked(|| {
            let mut collection = self.read_collection()?;
            apply(collection.entry(session_id));
            self.write_collection(&collection)
        })
    }

    /// Runs `f` while holding the exclusive store lock.
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_path = self.dir.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("Failed to lock session store: {}", lock_path.display()))?;

        // Released when `lock_file` is closed.
        f()
    }

    fn read_collection(&self) -> Result<SessionCollection> {
        let path = self.sessions_path();
        if !path.exists() {
            return Ok(SessionCollection::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session store: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(SessionCollection::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            QaError::Storage {
                message: format!("{} is not a valid session collection: {}", path.display(), e),
            }
            .into()
        })
    }

    fn write_collection(&self, collection: &SessionCollection) -> Result<()> {
        let path = self.sessions_path();
        let temp_path = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(collection)
            .context("Failed to serialize session collection")?;
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp session file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;
        Ok(())
    }
}

impl SessionStore for JsonFileSessionStore {
    fn create(&self, question: &str) -> Result<String> {
        self.create_at(question, Local::now())
    }

    fn append(&self, session_id: &str, step: Step, state: &WorkflowState) -> Result<()> {
        let now = Local::now();
        self.update(session_id, |session| session.record(step, state, now))
    }

    fn finalize(&self, session_id: &str, answer: &str, state: &WorkflowState) -> Result<()> {
        self.update(session_id, |session| {
            session.final_answer = Some(answer.to_string());
            session.complete_state = Some(CompleteState::of(state));
        })
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<Session>> {
        let mut sessions = self.read_collection()?.sessions;
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sessions.truncate(limit);
        Ok(sessions)
    }

    fn get(&self, session_id: &str) -> Result<Session> {
        self.read_collection()?
            .sessions
            .into_iter()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| {
                QaError::SessionNotFound {
                    session_id: session_id.to_string(),
                }
                .into()
            })
    }

    fn export(&self, session_id: &str) -> Result<PathBuf> {
        let session = self.get(session_id)?;
        let path = self.export_path(session_id);
        let content =
            serde_json::to_string_pretty(&session).context("Failed to serialize session")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write export file: {}", path.display()))?;
        Ok(path)
    }
}

/// Forwards every engine transition to a [`SessionStore`].
///
/// Store failures are logged and dropped; a run never fails because its
/// record could not be written.
pub struct SessionRecorder<'a> {
    store: &'a dyn SessionStore,
    session_id: String,
}

impl<'a> SessionRecorder<'a> {
    pub fn new(store: &'a dyn SessionStore, session_id: &str) -> Self {
        Self {
            store,
            session_id: session_id.to_string(),
        }
    }
}

impl TransitionObserver for SessionRecorder<'_> {
    fn on_transition(&self, step: Step, state: &WorkflowState) {
        if let Err(e) = self.store.append(&self.session_id, step, state) {
            tracing::warn!(
                "Failed to record {} for session {}: {:#}",
                step.node_name(),
                self.session_id,
                e
            );
        }
    }
}

/// Clock part (`HH:MM:SS`) of a stored timestamp.
fn clock_time(timestamp: &str) -> String {
    timestamp
        .split('T')
        .nth(1)
        .map(|time| time.chars().take(8).collect())
        .unwrap_or_default()
}

/// Multi-line summary: metadata, the step trace and the start of the answer.
pub fn render_summary(session: &Session) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "SESSION SUMMARY: {}", session.session_id);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Question: {}", session.question);
    let _ = writeln!(out, "Timestamp: {}", session.timestamp);
    let _ = writeln!(out);
    let _ = writeln!(out, "Metadata:");
    let _ = writeln!(
        out,
        "  - Total Iterations: {}",
        session.metadata.total_iterations
    );
    let _ = writeln!(out, "  - Search Used: {}", session.metadata.search_used);
    let _ = writeln!(out, "  - Reflections: {}", session.metadata.reflection_count);
    let _ = writeln!(out);
    let _ = writeln!(out, "Workflow Trace ({} states):", session.states.len());
    for entry in &session.states {
        let _ = writeln!(
            out,
            "  [{}] {} (Iteration {})",
            clock_time(&entry.timestamp),
            entry.node,
            entry.iteration
        );
    }

    if let Some(answer) = session.final_answer.as_deref().filter(|a| !a.is_empty()) {
        let head: String = answer.chars().take(SUMMARY_ANSWER_CHARS).collect();
        let _ = writeln!(out);
        let _ = writeln!(out, "Final Answer: {}...", head);
    }

    let _ = write!(out, "{}", rule);
    out
}

#[cfg(test)]
#[path = "tests/session_store_tests.rs"]
mod tests;
