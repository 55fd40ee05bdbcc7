//! Role-tagged messages and the bounded per-session conversation window.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Who a message speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Backend-assigned call id, echoed back in the tool result.
    pub id: String,
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls carried by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    /// Call id a tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant turn that only requests tool calls.
    pub fn tool_request(content: Option<String>, calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.unwrap_or_default(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// The result of a tool call.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// Sliding window over the most recent messages of a session.
///
/// Holds at most `capacity` messages; appending past that evicts from the front.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ConversationHistory {
    /// Default window size.
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Create a history holding at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a message, evicting the oldest entries past capacity.
    pub fn add(&mut self, role: Role, content: impl Into<String>) {
        self.push(Message::new(role, content));
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Copy of the stored messages in order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_most_recent_in_order() {
        let capacity = 4;
        let mut history = ConversationHistory::new(capacity);

        for i in 0..capacity + 3 {
            history.add(Role::User, format!("message {}", i));
            assert_eq!(history.len(), (i + 1).min(capacity));
        }

        let contents: Vec<String> = history.snapshot().into_iter().map(|m| m.content).collect();
        assert_eq!(
            contents,
            vec!["message 3", "message 4", "message 5", "message 6"]
        );
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut history = ConversationHistory::new(3);
        history.add(Role::User, "hello");

        let mut snapshot = history.snapshot();
        snapshot.push(Message::assistant("not stored"));
        snapshot[0].content = "changed".to_string();

        assert_eq!(history.len(), 1);
        assert_eq!(history.snapshot()[0].content, "hello");
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = ConversationHistory::new(0);
        history.add(Role::User, "a");
        history.add(Role::Assistant, "b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.snapshot(), vec![Message::assistant("b")]);
    }

    #[test]
    fn test_tool_result_carries_call_id() {
        let msg = Message::tool_result("call_1", "done");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(Role::Tool.to_string(), "tool");
    }
}
