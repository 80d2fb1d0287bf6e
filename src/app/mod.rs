pub mod cli;
pub mod menu;
pub mod run;
pub mod util;

use crate::config::QaConfig;
use crate::errors::QaError;
use crate::session_store::{render_summary, JsonFileSessionStore, SessionStore};
use anyhow::Result;
use cli::Cli;
use run::{print_recent_sessions, run_qa_workflow, Runtime};

/// Dispatches one invocation of the binary.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = QaConfig::resolve(cli.config.as_deref()).map_err(into_configuration_error)?;
    if let Some(dir) = &cli.memory_dir {
        config.memory_dir = Some(dir.clone());
    }

    let store = JsonFileSessionStore::new(&config.memory_dir()?)?;

    if cli.list_sessions {
        return print_recent_sessions(&store, cli.limit);
    }
    if let Some(session_id) = &cli.show {
        let session = store.get(session_id)?;
        println!("{}", render_summary(&session));
        return Ok(());
    }
    if let Some(session_id) = &cli.export {
        let path = store.export(session_id)?;
        println!("Exported session to: {}", path.display());
        return Ok(());
    }

    let runtime = Runtime::new(config, store)?;
    runtime.announce();

    match cli.question_text() {
        Some(question) => {
            let max_iterations = cli
                .max_iterations
                .unwrap_or(runtime.config.max_iterations);
            run_qa_workflow(&runtime, &question, max_iterations).await?;
            Ok(())
        }
        None => menu::run_menu(&runtime).await,
    }
}

/// Classifies any config loading failure as a configuration error.
fn into_configuration_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<QaError>() {
        Ok(qa_error) => qa_error.into(),
        Err(other) => QaError::configuration(format!("{:#}", other)).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_failures_become_configuration_errors() {
        let err = into_configuration_error(anyhow::anyhow!("bad yaml"));
        let qa_error = err.downcast_ref::<QaError>().unwrap();
        assert!(qa_error.is_configuration());
        assert_eq!(qa_error.to_string(), "configuration error: bad yaml");
    }

    #[test]
    fn test_existing_configuration_error_is_not_rewrapped() {
        let err = into_configuration_error(QaError::configuration("missing key").into());
        assert_eq!(err.to_string(), "configuration error: missing key");
    }
}
