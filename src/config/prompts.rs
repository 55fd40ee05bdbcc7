//! Agent instructions for Switchboard.
//!
//! Instructions can be customized by placing an `agents.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System message seeded at the start of every request.
    pub orchestration: String,
    pub agents: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            orchestration: "You have access to various specialized agents including a web researcher, \
                an explainer, a YouTube transcriber, a transcript analyst, a podcast catalog agent \
                and a podcast episode analyzer. Use them as needed based on the user's query."
                .to_string(),
            agents: AgentPrompts::default(),
            variables: Default::default(),
        }
    }
}

/// Instructions and optional model pin for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentPrompt {
    pub instructions: String,
    /// Overrides `backend.model` for this agent.
    pub model: Option<String>,
}

impl AgentPrompt {
    fn new(instructions: &str) -> Self {
        Self {
            instructions: instructions.to_string(),
            model: None,
        }
    }
}

/// Instructions for every agent in the standard registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub manager: AgentPrompt,
    pub researcher: AgentPrompt,
    pub explainer: AgentPrompt,
    pub youtube_transcriber: AgentPrompt,
    pub transcript_analyst: AgentPrompt,
    pub podcast_agent: AgentPrompt,
    pub episode_analyzer: AgentPrompt,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            manager: AgentPrompt::new(
                r#"You oversee the research and explanation process.

You delegate tasks to the researcher, explainer, YouTube transcriber, transcript analyst and podcast agent.
- If you need YouTube video transcripts, transfer to the YouTube transcriber.
- For questions about the content of a transcript already in the conversation, transfer to the transcript analyst.
- For questions about podcasts and their catalogs, transfer to the podcast agent.
- For questions about a specific podcast episode whose list is already known, transfer to the episode analyzer.
- For current events or facts you need to look up, transfer to the researcher.
- For requests to explain a concept simply, transfer to the explainer.

You may search for videos or fetch podcast episodes yourself when that answers the question directly."#,
            ),
            researcher: AgentPrompt::new(
                r#"You are a web research agent. Your responsibility is to run precise web searches and report what you find.

Guidelines:
- Search before answering anything that depends on current or factual information
- Prefer authoritative sources and say where each finding came from
- Synthesize the results into a clear, concise answer
- If the search fails or finds nothing relevant, say so plainly"#,
            ),
            explainer: AgentPrompt::new(
                "You explain things in a way that is easy to understand. Use plain words, short \
                 sentences and a concrete example when it helps.",
            ),
            youtube_transcriber: AgentPrompt::new(
                r#"You retrieve transcripts from YouTube videos.

When given a topic or query, fetch the transcript of the most relevant video.
Once the transcript is in the conversation, transfer to the transcript analyst so it can answer the user's question."#,
            ),
            transcript_analyst: AgentPrompt::new(
                r#"You analyze YouTube video transcripts and answer questions about them.

- Transcripts fetched earlier appear in the conversation as tool results
- Give concise, accurate answers grounded in the transcript text
- When asked for specific information, quote or paraphrase the most relevant part
- If the transcript does not cover the question, say so"#,
            ),
            podcast_agent: AgentPrompt::new(
                r#"You handle queries about Apple podcasts.

You can fetch the list of episodes of a podcast by name, optionally narrowed by an episode title.
When the user asks about specific episodes or their content, fetch the episode list first and then
transfer to the episode analyzer. The episode list you fetched stays in the conversation for it."#,
            ),
            episode_analyzer: AgentPrompt::new(
                r#"You analyze podcast episode lists and answer specific questions about episodes.

When you receive a list of episodes, review it carefully and:
1. Match the episode titles or IDs mentioned in the user's query
2. Extract the information relevant to the user's question
3. If an episode is found, describe it in detail
4. If an episode is not found, suggest similar episodes from the list

You can also look up episodes from podcasts fetched earlier in this session."#,
            ),
        }
    }
}

/// Partial `agents.toml` contents. Only fields present in the file replace the built-in values.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PromptsOverride {
    orchestration: Option<String>,
    agents: std::collections::BTreeMap<String, AgentPromptOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AgentPromptOverride {
    instructions: Option<String>,
    model: Option<String>,
}

impl AgentPrompts {
    fn get_mut(&mut self, name: &str) -> Option<&mut AgentPrompt> {
        match name {
            "manager" => Some(&mut self.manager),
            "researcher" => Some(&mut self.researcher),
            "explainer" => Some(&mut self.explainer),
            "youtube_transcriber" => Some(&mut self.youtube_transcriber),
            "transcript_analyst" => Some(&mut self.transcript_analyst),
            "podcast_agent" => Some(&mut self.podcast_agent),
            "episode_analyzer" => Some(&mut self.episode_analyzer),
            _ => None,
        }
    }
}

impl Prompts {
    /// Apply an `agents.toml` document on top of the current prompts.
    fn apply_overrides(&mut self, content: &str) -> crate::error::Result<()> {
        let overrides: PromptsOverride = toml::from_str(content)?;

        if let Some(orchestration) = overrides.orchestration {
            self.orchestration = orchestration;
        }

        for (name, agent) in overrides.agents {
            let prompt = self.agents.get_mut(&name).ok_or_else(|| {
                crate::error::SwitchboardError::Configuration(format!(
                    "agents.toml: unknown agent '{}'",
                    name
                ))
            })?;
            if let Some(instructions) = agent.instructions {
                prompt.instructions = instructions;
            }
            if let Some(model) = agent.model {
                prompt.model = Some(model).filter(|m| !m.trim().is_empty());
            }
        }
        Ok(())
    }

    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agents_path = custom_path.join("agents.toml");
            if agents_path.exists() {
                let content = std::fs::read_to_string(&agents_path)?;
                prompts.apply_overrides(&content)?;
            }
        }

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a template with the custom config variables.
    pub fn render_custom(&self, template: &str) -> String {
        Self::render(template, &self.variables)
    }
}
