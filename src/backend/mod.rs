//! Language model backends.
//!
//! A backend takes an agent and the message sequence and returns either a text
//! answer or a list of tool calls. It knows nothing about transfers: those are
//! resolved by the dispatcher against the agent's tool set.

mod openai;

pub use openai::OpenAIBackend;

use crate::agent::Agent;
use crate::conversation::{Message, ToolInvocation};
use crate::error::Result;
use async_trait::async_trait;

/// What the model produced for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// A final textual answer.
    Text(String),
    /// One or more tool calls, with any text the model emitted alongside.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolInvocation>,
    },
}

impl BackendReply {
    /// A reply requesting a single tool call.
    pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> Self {
        BackendReply::ToolCalls {
            content: None,
            calls: vec![ToolInvocation {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }
}

/// A language model that can act as any agent.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(&self, agent: &Agent, messages: &[Message]) -> Result<BackendReply>;
}

/// Backend replaying canned replies, for tests.
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use crate::error::SwitchboardError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&Agent, &[Message]) -> Result<BackendReply> + Send + Sync>;

    enum Script {
        Queue(Mutex<VecDeque<Result<BackendReply>>>),
        Responder(Responder),
    }

    /// One recorded call: which agent ran and what it was given.
    #[derive(Debug, Clone)]
    pub struct Invocation {
        pub agent: String,
        pub messages: Vec<Message>,
    }

    pub struct ScriptedBackend {
        script: Script,
        invocations: Mutex<Vec<Invocation>>,
    }

    impl ScriptedBackend {
        /// Replay `replies` in order; fails once they run out.
        pub fn new(replies: Vec<Result<BackendReply>>) -> Self {
            Self {
                script: Script::Queue(Mutex::new(replies.into())),
                invocations: Mutex::new(Vec::new()),
            }
        }

        /// Compute each reply from the agent and messages.
        pub fn from_fn(
            f: impl Fn(&Agent, &[Message]) -> Result<BackendReply> + Send + Sync + 'static,
        ) -> Self {
            Self {
                script: Script::Responder(Box::new(f)),
                invocations: Mutex::new(Vec::new()),
            }
        }

        pub fn invocations(&self) -> Vec<Invocation> {
            self.invocations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn complete(&self, agent: &Agent, messages: &[Message]) -> Result<BackendReply> {
            self.invocations.lock().unwrap().push(Invocation {
                agent: agent.name().to_string(),
                messages: messages.to_vec(),
            });

            match &self.script {
                Script::Queue(queue) => queue.lock().unwrap().pop_front().unwrap_or_else(|| {
                    Err(SwitchboardError::Backend("script exhausted".to_string()))
                }),
                Script::Responder(f) => f(agent, messages),
            }
        }
    }
}
