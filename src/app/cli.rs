use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qa")]
#[command(about = "Iterative question answering: draft, self-evaluate, reflect, polish")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("QA_AGENT_GIT_SHA"), ")"))]
pub struct Cli {
    /// The question to answer (all arguments are joined). Omit it to open the
    /// interactive menu.
    pub question: Vec<String>,

    /// Maximum answer iterations (defaults to the configured value)
    #[arg(short, long)]
    pub max_iterations: Option<u32>,

    /// Config file (defaults to ~/.qa-agent/config.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding sessions.json and exported sessions
    #[arg(long)]
    pub memory_dir: Option<PathBuf>,

    /// List recent sessions
    #[arg(long)]
    pub list_sessions: bool,

    /// Number of sessions shown by --list-sessions
    #[arg(long, default_value = "5")]
    pub limit: usize,

    /// Print the summary of a stored session
    #[arg(long, value_name = "SESSION_ID")]
    pub show: Option<String>,

    /// Export a stored session to session_<id>.json
    #[arg(long, value_name = "SESSION_ID")]
    pub export: Option<String>,
}

impl Cli {
    /// The joined question, or `None` when no words were given.
    pub fn question_text(&self) -> Option<String> {
        let joined = self.question.join(" ");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_words_are_joined() {
        let cli = Cli::try_parse_from(["qa", "-m", "2", "What", "is", "Rust?"]).unwrap();
        assert_eq!(cli.question_text().as_deref(), Some("What is Rust?"));
        assert_eq!(cli.max_iterations, Some(2));
    }

    #[test]
    fn test_flags_after_question_words_are_parsed() {
        let cli = Cli::try_parse_from(["qa", "What", "is", "Rust?", "-m", "2"]).unwrap();
        assert_eq!(cli.question_text().as_deref(), Some("What is Rust?"));
        assert_eq!(cli.max_iterations, Some(2));

        let cli =
            Cli::try_parse_from(["qa", "Why", "--memory-dir", "/tmp/qa", "now?"]).unwrap();
        assert_eq!(cli.question_text().as_deref(), Some("Why now?"));
        assert_eq!(cli.memory_dir, Some(PathBuf::from("/tmp/qa")));
    }

    #[test]
    fn test_no_arguments_means_menu() {
        let cli = Cli::try_parse_from(["qa"]).unwrap();
        assert_eq!(cli.question_text(), None);
        assert_eq!(cli.max_iterations, None);
        assert_eq!(cli.limit, 5);
    }

    #[test]
    fn test_session_commands() {
        let cli = Cli::try_parse_from(["qa", "--list-sessions", "--limit", "10"]).unwrap();
        assert!(cli.list_sessions);
        assert_eq!(cli.limit, 10);

        let cli = Cli::try_parse_from(["qa", "--export", "20260101_120000"]).unwrap();
        assert_eq!(cli.export.as_deref(), Some("20260101_120000"));
        assert_eq!(cli.show, None);
    }
}
