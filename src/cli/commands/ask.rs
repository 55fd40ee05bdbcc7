//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    trace: bool,
    mut settings: Settings,
) -> Result<()> {
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

    let spinner = Output::spinner("Routing question...");
    let outcome = session.ask(question).await;
    spinner.finish_and_clear();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    };

    println!("\n{}\n", outcome.answer);

    if !outcome.completed {
        Output::warning("The agents could not fully complete this request.");
    }
    if trace {
        Output::trace(&outcome);
    }

    Ok(())
}
