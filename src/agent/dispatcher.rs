//! The delegation loop.
//!
//! State is (current agent, shared message sequence, remaining steps). Each step
//! invokes the current agent once; its reply is either a final answer, data tool
//! calls whose results are appended to the shared sequence, or a transfer that
//! hands the same sequence to another agent.

use super::registry::{Agent, AgentRegistry, Tool};
use crate::backend::{BackendReply, ModelBackend};
use crate::conversation::{ConversationHistory, Message, Role, ToolInvocation};
use crate::error::{Result, SwitchboardError};
use crate::memory::CatalogMemory;
use crate::tools::{parse_tool_call, ToolCall, ToolContext};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default step budget per request.
pub const DEFAULT_MAX_STEPS: usize = 15;

const BACKEND_APOLOGY: &str = "I'm sorry, I couldn't reach the language model to answer your \
question. Please try again in a moment.";

/// Runs requests through the agent graph.
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    backend: Arc<dyn ModelBackend>,
    tools: Arc<ToolContext>,
    orchestration: Option<String>,
    max_steps: usize,
    max_retries: usize,
}

/// Result of one request.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    /// Text shown to the user. Never empty.
    pub answer: String,
    /// Agents that held control, in order, starting with the entry agent.
    pub agents: Vec<String>,
    /// Every tool call made, including transfers.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of agent invocations.
    pub steps: usize,
    /// False when the answer is a fallback for budget exhaustion or backend failure.
    pub completed: bool,
}

/// Record of a tool call made by an agent.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    /// Agent that made the call.
    pub agent: String,
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Content of the tool message appended for this call.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// What a single tool call resolves to for the calling agent.
enum Action<'a> {
    Fetch(ToolCall),
    Transfer(&'a Agent),
    Reject(String),
}

impl Dispatcher {
    pub fn new(
        registry: Arc<AgentRegistry>,
        backend: Arc<dyn ModelBackend>,
        tools: Arc<ToolContext>,
    ) -> Self {
        Self {
            registry,
            backend,
            tools,
            orchestration: None,
            max_steps: DEFAULT_MAX_STEPS,
            max_retries: 1,
        }
    }

    /// System message placed at the head of every request.
    pub fn with_orchestration(mut self, text: &str) -> Self {
        self.orchestration = Some(text.to_string()).filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Extra attempts after a failed backend call.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Initial message sequence: orchestration overview, stored catalogs, then history.
    pub fn seed(&self, history: &ConversationHistory, memory: &CatalogMemory) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(orchestration) = &self.orchestration {
            messages.push(Message::system(orchestration.clone()));
        }
        if let Some(summary) = memory.context_summary() {
            messages.push(Message::system(summary));
        }
        messages.extend(history.snapshot());
        messages
    }

    /// Run the delegation loop for the request at the end of `history`.
    ///
    /// Always produces an answer: adapter failures become tool messages, backend
    /// failures and budget exhaustion end the run with a degraded answer.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn run(&self, history: &ConversationHistory, memory: &CatalogMemory) -> DispatchOutcome {
        let mut messages = self.seed(history, memory);
        let seeded = messages.len();

        let mut current = self.registry.entry();
        let mut agents = vec![current.name().to_string()];
        let mut tool_calls = Vec::new();
        let mut steps = 0;

        loop {
            if steps >= self.max_steps {
                warn!("{}", SwitchboardError::BudgetExceeded { steps });
                let answer = last_assistant_text(&messages[seeded..]).unwrap_or_else(|| {
                    format!(
                        "I could not complete this request within {} steps. \
                        Please try rephrasing or narrowing your question.",
                        self.max_steps
                    )
                });
                return DispatchOutcome {
                    answer,
                    agents,
                    tool_calls,
                    steps,
                    completed: false,
                };
            }
            steps += 1;

            debug!("Step {}: invoking {}", steps, current.name());
            let reply = match self.complete_with_retry(current, &messages).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Giving up on {} after backend failure: {}", current.name(), e);
                    return DispatchOutcome {
                        answer: BACKEND_APOLOGY.to_string(),
                        agents,
                        tool_calls,
                        steps,
                        completed: false,
                    };
                }
            };

            // a tool-call reply without calls is a plain answer
            let reply = match reply {
                BackendReply::ToolCalls { content, calls } if calls.is_empty() => {
                    BackendReply::Text(content.unwrap_or_default())
                }
                reply => reply,
            };

            let (content, calls) = match reply {
                BackendReply::Text(text) if text.trim().is_empty() => {
                    warn!("{} returned an empty answer", current.name());
                    let answer = last_assistant_text(&messages[seeded..]).unwrap_or_else(|| {
                        "I wasn't able to produce an answer to that question.".to_string()
                    });
                    return DispatchOutcome {
                        answer,
                        agents,
                        tool_calls,
                        steps,
                        completed: false,
                    };
                }
                BackendReply::Text(text) => {
                    info!("{} answered after {} steps", current.name(), steps);
                    return DispatchOutcome {
                        answer: text,
                        agents,
                        tool_calls,
                        steps,
                        completed: true,
                    };
                }
                BackendReply::ToolCalls { content, calls } => (content, calls),
            };

            messages.push(Message::tool_request(content, calls.clone()));

            let mut next = None;
            for call in &calls {
                let result = match self.resolve(current, call) {
                    Action::Fetch(parsed) => {
                        info!("{} calling tool: {} with args: {}", current.name(), call.name, call.arguments);
                        match self.tools.execute(&parsed, memory).await {
                            Ok(output) => output,
                            Err(e) => {
                                warn!("Tool {} failed: {}", call.name, e);
                                format!("Tool error: {}", e)
                            }
                        }
                    }
                    Action::Transfer(target) => {
                        info!("Transfer {} -> {}", current.name(), target.name());
                        next = Some(target);
                        serde_json::json!({ "assistant": target.title() }).to_string()
                    }
                    Action::Reject(reason) => {
                        warn!("{} made an invalid call to {}: {}", current.name(), call.name, reason);
                        format!("Tool error: {}", reason)
                    }
                };

                messages.push(Message::tool_result(call.id.clone(), result.clone()));
                tool_calls.push(ToolCallRecord {
                    agent: current.name().to_string(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result,
                });
            }

            if let Some(target) = next {
                current = target;
                agents.push(current.name().to_string());
            }
        }
    }

    /// Resolve a call against the agent's own tools. Only owned tools run.
    fn resolve(&self, agent: &Agent, call: &ToolInvocation) -> Action<'_> {
        match agent.resolve(&call.name) {
            Some(Tool::Data(tool)) => match parse_tool_call(*tool, &call.arguments) {
                Ok(parsed) => Action::Fetch(parsed),
                Err(e) => Action::Reject(e.to_string()),
            },
            // targets were checked when the registry was built
            Some(Tool::Transfer(target)) => match self.registry.get(target) {
                Some(agent) => Action::Transfer(agent),
                None => Action::Reject(format!("Unknown agent '{}'", target)),
            },
            None => Action::Reject(format!(
                "'{}' is not available to the {} agent",
                call.name,
                agent.title()
            )),
        }
    }

    async fn complete_with_retry(&self, agent: &Agent, messages: &[Message]) -> Result<BackendReply> {
        let mut attempt = 0;
        loop {
            match self.backend.complete(agent, messages).await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Backend call for {} failed (attempt {}): {}", agent.name(), attempt, e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn last_assistant_text(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant && !m.content.trim().is_empty())
        .map(|m| m.content.clone())
}
