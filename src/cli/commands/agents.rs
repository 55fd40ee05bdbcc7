//! Agents command: print the registry graph.

use crate::agent::{AgentRegistry, Tool};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use anyhow::Result;

/// Run the agents command.
pub fn run_agents(settings: &Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let registry = AgentRegistry::standard(&prompts)?;

    Output::header("Agents");
    for agent in registry.agents() {
        let entry = if agent.name() == registry.entry().name() {
            " (entry)"
        } else {
            ""
        };
        println!();
        Output::list_item(&format!("{} [{}]{}", agent.title(), agent.name(), entry));
        Output::kv("Model", agent.model().unwrap_or(&settings.backend.model));

        let tools: Vec<String> = agent
            .tools()
            .iter()
            .filter_map(|t| match t {
                Tool::Data(tool) => Some(tool.name().to_string()),
                Tool::Transfer(_) => None,
            })
            .collect();
        if !tools.is_empty() {
            Output::kv("Tools", &tools.join(", "));
        }

        let targets: Vec<&str> = agent.transfer_targets().collect();
        if !targets.is_empty() {
            Output::kv("Hands off to", &targets.join(", "));
        }
    }

    println!();
    Output::info(&format!(
        "{} agents, {} hand-off edges",
        registry.len(),
        registry.edges().len()
    ));
    Ok(())
}
