use crate::app::run::{print_recent_sessions, run_qa_workflow, Runtime, DEFAULT_QUESTION};
use crate::app::util::rule;
use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

const RECENT_SESSIONS: usize = 5;

/// Interactive loop: ask, list recent sessions, or exit. End of input exits.
pub async fn run_menu(runtime: &Runtime) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let default_iterations = runtime.config.max_iterations;

    loop {
        println!("\n{}", rule());
        println!("Options:");
        println!("1. Ask a new question");
        println!("2. View recent sessions");
        println!("3. Exit");
        println!("{}", rule());

        let Some(choice) = prompt(&mut lines, "\nSelect option (1-3): ").await? else {
            break;
        };

        match choice.as_str() {
            "1" => {
                let Some(input) = prompt(&mut lines, "\nAsk me a question: ").await? else {
                    break;
                };
                let question = question_or_default(&input);
                if input.is_empty() {
                    println!("Using default question: {}", question);
                }

                let label = format!("Max iterations (default {}): ", default_iterations);
                let Some(input) = prompt(&mut lines, &label).await? else {
                    break;
                };
                let max_iterations = match parse_max_iterations(&input, default_iterations) {
                    Some(n) => n,
                    None => {
                        println!("Invalid number, using default {}", default_iterations);
                        default_iterations
                    }
                };

                if let Err(e) = run_qa_workflow(runtime, &question, max_iterations).await {
                    println!("\nERROR: {:#}", e);
                }
            }
            "2" => {
                if let Err(e) = print_recent_sessions(&runtime.store, RECENT_SESSIONS) {
                    println!("\nERROR: {:#}", e);
                }
            }
            "3" => {
                println!("\nGoodbye!");
                break;
            }
            _ => println!("Invalid option"),
        }
    }

    Ok(())
}

/// Prints `label` and reads one trimmed line; `None` on end of input.
async fn prompt<R>(lines: &mut Lines<R>, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{}", label);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let line = lines.next_line().await.context("Failed to read stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}

fn question_or_default(input: &str) -> String {
    if input.trim().is_empty() {
        DEFAULT_QUESTION.to_string()
    } else {
        input.trim().to_string()
    }
}

/// Empty input keeps the default; anything but a positive integer is rejected.
fn parse_max_iterations(input: &str, default: u32) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() {
        return Some(default);
    }
    input.parse::<u32>().ok().filter(|n| *n > 0)
}
