//! OpenAI chat completions backend with function calling.

use super::{BackendReply, ModelBackend};
use crate::agent::{Agent, Tool};
use crate::config::BackendSettings;
use crate::conversation::{Message, Role, ToolInvocation};
use crate::error::{Result, SwitchboardError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Backend calling the OpenAI chat completions API.
pub struct OpenAIBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_seconds))?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

fn build_error(e: impl std::fmt::Display) -> SwitchboardError {
    SwitchboardError::Backend(e.to_string())
}

/// Reasoning models reject sampling parameters.
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
}

/// Early reasoning models accept neither system messages nor tools.
fn is_legacy_reasoning_model(model: &str) -> bool {
    model.starts_with("o1-mini") || model.starts_with("o1-preview")
}

/// Convert a conversation message to the OpenAI request format.
fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let converted: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        Role::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !message.content.is_empty() {
                args.content(message.content.clone());
            }
            if !message.tool_calls.is_empty() {
                let calls: Vec<ChatCompletionMessageToolCall> = message
                    .tool_calls
                    .iter()
                    .map(|call| ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect();
                args.tool_calls(calls);
            }
            args.build().map_err(build_error)?.into()
        }
        Role::Tool => {
            let call_id = message.tool_call_id.as_deref().ok_or_else(|| {
                SwitchboardError::Backend("tool message without a call id".to_string())
            })?;
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call_id)
                .content(message.content.clone())
                .build()
                .map_err(build_error)?
                .into()
        }
    };
    Ok(converted)
}

/// Full request sequence for one invocation: agent instructions, then `messages`.
///
/// For legacy reasoning models system messages are sent with the user role.
fn request_messages(
    agent: &Agent,
    messages: &[Message],
    model: &str,
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let legacy = is_legacy_reasoning_model(model);
    std::iter::once(Message::system(agent.instructions()))
        .chain(messages.iter().cloned())
        .map(|message| match message.role {
            Role::System if legacy => to_request_message(&Message::user(message.content)),
            _ => to_request_message(&message),
        })
        .collect()
}

/// Function definitions for the agent's tools. Transfers take no arguments.
pub fn tool_definitions(agent: &Agent) -> Vec<ChatCompletionTool> {
    agent
        .tools()
        .iter()
        .map(|tool| {
            let (description, parameters) = match tool {
                Tool::Data(data) => (data.description().to_string(), data.parameters()),
                Tool::Transfer(target) => (
                    format!(
                        "Transfer control to the {} agent, which will continue the conversation.",
                        target.replace('_', " ")
                    ),
                    serde_json::json!({ "type": "object", "properties": {} }),
                ),
            };

            ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name(),
                    description: Some(description),
                    parameters: Some(parameters),
                    strict: None,
                },
            }
        })
        .collect()
}

#[async_trait]
impl ModelBackend for OpenAIBackend {
    #[instrument(skip(self, agent, messages), fields(agent = agent.name(), messages = messages.len()))]
    async fn complete(&self, agent: &Agent, messages: &[Message]) -> Result<BackendReply> {
        let model = agent.model().unwrap_or(&self.model);

        // Instructions lead every invocation without joining the shared sequence
        let sequence = request_messages(agent, messages, model)?;

        let tools = tool_definitions(agent);
        if !tools.is_empty() && is_legacy_reasoning_model(model) {
            warn!("{} does not support tools; {} will only answer directly", model, agent.name());
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(sequence)
            .max_completion_tokens(self.max_tokens);
        if !tools.is_empty() && !is_legacy_reasoning_model(model) {
            args.tools(tools);
        }
        if !is_reasoning_model(model) {
            args.temperature(self.temperature);
        }
        let request = args.build().map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SwitchboardError::Backend(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SwitchboardError::Backend("No response from model".to_string()))?;

        let content = choice.message.content.filter(|c| !c.trim().is_empty());
        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                debug!("Model requested {} tool calls", calls.len());
                Ok(BackendReply::ToolCalls {
                    content,
                    calls: calls
                        .into_iter()
                        .map(|call| ToolInvocation {
                            id: call.id,
                            name: call.function.name,
                            arguments: call.function.arguments,
                        })
                        .collect(),
                })
            }
            _ => Ok(BackendReply::Text(content.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRegistry;
    use crate::config::Prompts;

    #[test]
    fn test_tool_definitions_include_transfers() {
        let registry = AgentRegistry::standard(&Prompts::default()).unwrap();
        let podcast = registry.get("podcast_agent").unwrap();

        let names: Vec<String> = tool_definitions(podcast)
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(names, vec!["get_episodes_by_title", "transfer_to_episode_analyzer"]);

        let explainer = registry.get("explainer").unwrap();
        assert!(tool_definitions(explainer).is_empty());
    }

    #[test]
    fn test_message_conversion() {
        let request = Message::tool_request(
            None,
            vec![ToolInvocation {
                id: "call_1".to_string(),
                name: "web_search".to_string(),
                arguments: r#"{"query":"rates"}"#.to_string(),
            }],
        );
        assert!(matches!(
            to_request_message(&request).unwrap(),
            ChatCompletionRequestMessage::Assistant(_)
        ));

        let result = Message::tool_result("call_1", "no results");
        assert!(matches!(
            to_request_message(&result).unwrap(),
            ChatCompletionRequestMessage::Tool(_)
        ));

        let orphan = Message::new(Role::Tool, "lost");
        assert!(to_request_message(&orphan).is_err());
    }

    #[test]
    fn test_reasoning_models_detected() {
        assert!(is_reasoning_model("o1-mini"));
        assert!(!is_reasoning_model("gpt-4o"));
        assert!(is_legacy_reasoning_model("o1-mini"));
        assert!(!is_legacy_reasoning_model("o3-mini"));
    }

    #[test]
    fn test_legacy_reasoning_model_gets_instructions_as_user_message() {
        let registry = AgentRegistry::standard(&Prompts::default()).unwrap();
        let explainer = registry.get("explainer").unwrap();
        let messages = vec![
            Message::system("Available podcast episodes: none"),
            Message::user("What is inflation?"),
        ];

        let legacy = request_messages(explainer, &messages, "o1-mini").unwrap();
        assert_eq!(legacy.len(), 3);
        assert!(legacy
            .iter()
            .all(|m| matches!(m, ChatCompletionRequestMessage::User(_))));

        let regular = request_messages(explainer, &messages, "gpt-4o").unwrap();
        assert!(matches!(regular[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(regular[1], ChatCompletionRequestMessage::System(_)));
    }
}
