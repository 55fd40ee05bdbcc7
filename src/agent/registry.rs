//! Agent definitions and the closed registry they live in.
//!
//! The registry is a directed graph: agents are nodes and transfer tools are edges.
//! It is validated once at construction and never changes afterwards.

use crate::config::{AgentPrompt, Prompts};
use crate::error::{Result, SwitchboardError};
use crate::tools::DataTool;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Names of the agents in the standard registry.
pub mod names {
    pub const MANAGER: &str = "manager";
    pub const RESEARCHER: &str = "researcher";
    pub const EXPLAINER: &str = "explainer";
    pub const YOUTUBE_TRANSCRIBER: &str = "youtube_transcriber";
    pub const TRANSCRIPT_ANALYST: &str = "transcript_analyst";
    pub const PODCAST_AGENT: &str = "podcast_agent";
    pub const EPISODE_ANALYZER: &str = "episode_analyzer";
}

const TRANSFER_PREFIX: &str = "transfer_to_";

/// Function name of the transfer tool targeting `agent`.
pub fn transfer_tool_name(agent: &str) -> String {
    format!("{}{}", TRANSFER_PREFIX, agent)
}

/// Something an agent can call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    /// Fetch data through an adapter.
    Data(DataTool),
    /// Hand control to the named agent.
    Transfer(String),
}

impl Tool {
    pub fn name(&self) -> String {
        match self {
            Tool::Data(tool) => tool.name().to_string(),
            Tool::Transfer(target) => transfer_tool_name(target),
        }
    }
}

/// A specialist role.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    title: String,
    instructions: String,
    model: Option<String>,
    tools: Vec<Tool>,
}

impl Agent {
    pub fn new(name: &str, title: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            instructions: instructions.to_string(),
            model: None,
            tools: Vec::new(),
        }
    }

    /// Build from configured instructions, rendering custom variables.
    pub fn from_prompt(name: &str, title: &str, prompt: &AgentPrompt, prompts: &Prompts) -> Self {
        let mut agent = Self::new(name, title, &prompts.render_custom(&prompt.instructions));
        agent.model = prompt.model.clone().filter(|m| !m.is_empty());
        agent
    }

    /// Pin this agent to a specific model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_tool(mut self, tool: DataTool) -> Self {
        self.tools.push(Tool::Data(tool));
        self
    }

    pub fn with_transfer(mut self, target: &str) -> Self {
        self.tools.push(Tool::Transfer(target.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Look up one of this agent's tools by function name.
    pub fn resolve(&self, tool_name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name() == tool_name)
    }

    /// Agents this one can transfer to.
    pub fn transfer_targets(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().filter_map(|t| match t {
            Tool::Transfer(target) => Some(target.as_str()),
            Tool::Data(_) => None,
        })
    }
}

/// Validated, immutable set of agents.
#[derive(Debug)]
pub struct AgentRegistry {
    agents: IndexMap<String, Agent>,
    entry: String,
}

/// Collects agents before validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    agents: Vec<Agent>,
    entry: Option<String>,
}

impl RegistryBuilder {
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Agent that receives every request first. Defaults to the first agent added.
    pub fn entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    /// Validate the graph.
    ///
    /// Fails on duplicate agent names, duplicate tools within an agent, transfers to
    /// unknown agents or to the agent itself, and transfers back to the entry agent.
    pub fn build(self) -> Result<AgentRegistry> {
        let entry = self
            .entry
            .or_else(|| self.agents.first().map(|a| a.name.clone()))
            .ok_or_else(|| config_error("registry has no agents".to_string()))?;

        let mut agents = IndexMap::new();
        for agent in self.agents {
            if agent.name.trim().is_empty() {
                return Err(config_error("agent name must not be empty".to_string()));
            }
            let name = agent.name.clone();
            if agents.insert(name.clone(), agent).is_some() {
                return Err(config_error(format!("agent '{}' is registered twice", name)));
            }
        }

        if !agents.contains_key(&entry) {
            return Err(config_error(format!("entry agent '{}' is not registered", entry)));
        }

        for agent in agents.values() {
            let mut seen = HashSet::new();
            for tool in &agent.tools {
                if !seen.insert(tool.name()) {
                    return Err(config_error(format!(
                        "agent '{}' declares '{}' more than once",
                        agent.name,
                        tool.name()
                    )));
                }
            }

            for target in agent.transfer_targets() {
                if !agents.contains_key(target) {
                    return Err(config_error(format!(
                        "agent '{}' transfers to unknown agent '{}'",
                        agent.name, target
                    )));
                }
                if target == agent.name {
                    return Err(config_error(format!(
                        "agent '{}' transfers to itself",
                        agent.name
                    )));
                }
                if target == entry {
                    return Err(config_error(format!(
                        "agent '{}' transfers back to entry agent '{}'",
                        agent.name, entry
                    )));
                }
            }
        }

        Ok(AgentRegistry { agents, entry })
    }
}

fn config_error(message: String) -> SwitchboardError {
    SwitchboardError::Configuration(format!("Invalid agent registry: {}", message))
}

impl AgentRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The standard graph: a manager delegating to six specialists, with
    /// transcriber -> transcript analyst and podcast agent -> episode analyzer pipelines.
    pub fn standard(prompts: &Prompts) -> Result<Self> {
        use names::*;

        let p = &prompts.agents;

        Self::builder()
            .agent(
                Agent::from_prompt(MANAGER, "Manager", &p.manager, prompts)
                    .with_transfer(RESEARCHER)
                    .with_transfer(EXPLAINER)
                    .with_transfer(YOUTUBE_TRANSCRIBER)
                    .with_transfer(TRANSCRIPT_ANALYST)
                    .with_transfer(PODCAST_AGENT)
                    .with_transfer(EPISODE_ANALYZER)
                    .with_tool(DataTool::SearchVideos)
                    .with_tool(DataTool::GetEpisodesByTitle),
            )
            .agent(
                Agent::from_prompt(RESEARCHER, "Researcher", &p.researcher, prompts)
                    .with_tool(DataTool::WebSearch),
            )
            .agent(Agent::from_prompt(EXPLAINER, "Explainer", &p.explainer, prompts))
            .agent(
                Agent::from_prompt(
                    YOUTUBE_TRANSCRIBER,
                    "YouTube Transcriber",
                    &p.youtube_transcriber,
                    prompts,
                )
                .with_tool(DataTool::GetTranscript)
                .with_transfer(TRANSCRIPT_ANALYST),
            )
            .agent(Agent::from_prompt(
                TRANSCRIPT_ANALYST,
                "Transcript Analyst",
                &p.transcript_analyst,
                prompts,
            ))
            .agent(
                Agent::from_prompt(PODCAST_AGENT, "Podcast Agent", &p.podcast_agent, prompts)
                    .with_tool(DataTool::GetEpisodesByTitle)
                    .with_transfer(EPISODE_ANALYZER),
            )
            .agent(
                Agent::from_prompt(
                    EPISODE_ANALYZER,
                    "Podcast Episode Analyzer",
                    &p.episode_analyzer,
                    prompts,
                )
                .with_tool(DataTool::FindEpisode)
                .with_tool(DataTool::SearchEpisodes),
            )
            .entry(MANAGER)
            .build()
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    /// The agent every request starts with.
    pub fn entry(&self) -> &Agent {
        // presence checked in build()
        &self.agents[&self.entry]
    }

    /// Agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// All transfer edges as (from, to).
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.agents
            .values()
            .flat_map(|a| a.transfer_targets().map(move |t| (a.name(), t)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_config_error(result: Result<AgentRegistry>, fragment: &str) {
        match result {
            Err(SwitchboardError::Configuration(msg)) => {
                assert!(msg.contains(fragment), "unexpected message: {}", msg)
            }
            other => panic!("expected configuration error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_standard_registry_shape() {
        let registry = AgentRegistry::standard(&Prompts::default()).unwrap();

        assert_eq!(registry.len(), 7);
        assert_eq!(registry.entry().name(), names::MANAGER);

        let manager_targets: Vec<&str> = registry.entry().transfer_targets().collect();
        assert_eq!(manager_targets.len(), 6);

        let edges = registry.edges();
        assert!(edges.contains(&(names::PODCAST_AGENT, names::EPISODE_ANALYZER)));
        assert!(edges.contains(&(names::YOUTUBE_TRANSCRIBER, names::TRANSCRIPT_ANALYST)));
        assert!(edges.iter().all(|(_, to)| *to != names::MANAGER));
    }

    #[test]
    fn test_resolve_by_function_name() {
        let registry = AgentRegistry::standard(&Prompts::default()).unwrap();
        let podcast = registry.get(names::PODCAST_AGENT).unwrap();

        assert_eq!(
            podcast.resolve("transfer_to_episode_analyzer"),
            Some(&Tool::Transfer(names::EPISODE_ANALYZER.to_string()))
        );
        assert_eq!(
            podcast.resolve("get_episodes_by_title"),
            Some(&Tool::Data(DataTool::GetEpisodesByTitle))
        );
        assert_eq!(podcast.resolve("web_search"), None);
    }

    #[test]
    fn test_unknown_transfer_target_fails_at_build() {
        let result = AgentRegistry::builder()
            .agent(Agent::new("manager", "Manager", "route").with_transfer("ghost"))
            .build();
        assert_config_error(result, "unknown agent 'ghost'");
    }

    #[test]
    fn test_duplicate_transfer_edge_fails() {
        let result = AgentRegistry::builder()
            .agent(
                Agent::new("manager", "Manager", "route")
                    .with_transfer("worker")
                    .with_transfer("worker"),
            )
            .agent(Agent::new("worker", "Worker", "work"))
            .build();
        assert_config_error(result, "more than once");
    }

    #[test]
    fn test_transfer_back_to_entry_fails() {
        let result = AgentRegistry::builder()
            .agent(Agent::new("manager", "Manager", "route").with_transfer("worker"))
            .agent(Agent::new("worker", "Worker", "work").with_transfer("manager"))
            .build();
        assert_config_error(result, "back to entry");
    }

    #[test]
    fn test_duplicate_agent_and_missing_entry_fail() {
        let result = AgentRegistry::builder()
            .agent(Agent::new("a", "A", ""))
            .agent(Agent::new("a", "A again", ""))
            .build();
        assert_config_error(result, "registered twice");

        let result = AgentRegistry::builder()
            .agent(Agent::new("a", "A", ""))
            .entry("b")
            .build();
        assert_config_error(result, "entry agent 'b'");

        assert_config_error(AgentRegistry::builder().build(), "no agents");
    }

    #[test]
    fn test_pinned_model_from_prompt() {
        let mut prompts = Prompts::default();
        prompts.agents.explainer.model = Some("o1-mini".to_string());

        let registry = AgentRegistry::standard(&prompts).unwrap();
        assert_eq!(registry.get(names::EXPLAINER).unwrap().model(), Some("o1-mini"));
        assert_eq!(registry.entry().model(), None);
    }
}
