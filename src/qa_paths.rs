//! Home-based storage paths for all qa-agent persistence.
//!
//! Layout under `~/.qa-agent/`:
//! - `config.yaml` - Optional configuration file
//! - `memory/` - Session collection (`sessions.json`) and exported sessions
//! - `logs/<session-id>/` - Structured event logs per session

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const QA_AGENT_DIR: &str = ".qa-agent";

/// Returns `~/.qa-agent/`, creating it if needed.
pub fn qa_agent_home_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory for session storage")?;
    let dir = home.join(QA_AGENT_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create qa-agent directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the default config file path. The file itself may not exist.
pub fn config_path() -> Result<PathBuf> {
    Ok(qa_agent_home_dir()?.join("config.yaml"))
}

/// Returns `~/.qa-agent/memory/`, creating it if needed.
pub fn memory_dir() -> Result<PathBuf> {
    let dir = qa_agent_home_dir()?.join("memory");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create memory directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns `~/.qa-agent/logs/<session-id>/`, creating it if needed.
pub fn session_logs_dir(session_id: &str) -> Result<PathBuf> {
    let dir = qa_agent_home_dir()?.join("logs").join(session_id);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir)
}
