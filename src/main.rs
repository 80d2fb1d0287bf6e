mod agents;
mod app;
mod config;
mod errors;
mod phases;
mod qa_paths;
mod search;
mod session_store;
mod state;
mod structured_logger;
mod workflow;

use app::cli::Cli;
use clap::Parser;
use errors::QaError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "QA_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("qa=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let configuration = err
                .downcast_ref::<QaError>()
                .is_some_and(QaError::is_configuration);
            if configuration {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
