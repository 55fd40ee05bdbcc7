//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Exit,
    Clear,
    Memory,
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Empty
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else if line.eq_ignore_ascii_case("clear") {
        Input::Clear
    } else if line.eq_ignore_ascii_case("memory") {
        Input::Memory
    } else {
        Input::Question(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'switchboard doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    for warning in preflight::degraded_capabilities(&settings) {
        Output::warning(&warning);
    }

    if let Some(model) = model {
        settings.backend.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = orchestrator.session();

    println!("\n{}", style("Switchboard Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. 'clear' resets the conversation, 'memory' lists fetched episodes.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Clear => {
                session.clear();
                Output::info("Conversation history cleared.");
            }
            Input::Memory => print_memory(&session),
            Input::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = session.ask(question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(outcome) => {
                        println!("\n{} {}\n", style("Switchboard:").cyan().bold(), outcome.answer);
                        if outcome.agents.len() > 1 {
                            println!("{}\n", style(format!("via {}", outcome.agents.join(" -> "))).dim());
                        }
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

fn print_memory(session: &Session) {
    match session.memory().context_summary() {
        Some(summary) => println!("\n{}", summary),
        None => Output::info("No podcast episodes fetched yet."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   \n"), Input::Empty);
        assert_eq!(parse_input("EXIT\n"), Input::Exit);
        assert_eq!(parse_input("quit"), Input::Exit);
        assert_eq!(parse_input(" clear "), Input::Clear);
        assert_eq!(parse_input("memory"), Input::Memory);
        assert_eq!(
            parse_input("clear up the rate cuts episode\n"),
            Input::Question("clear up the rate cuts episode")
        );
    }
}
