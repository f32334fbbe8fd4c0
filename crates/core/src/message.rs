//! Message and Conversation domain types.
//!
//! These are the value objects that flow through the whole system:
//! user input → context assembly → completion call → streamed reply
//! appended back onto the Conversation.
//!
//! A `Message` is immutable once created. A `Conversation` is append-only
//! during a session, and its index 0 is always the initial assistant
//! greeting; trimming never removes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
///
/// A closed set of variants; role comparisons are never stringly-typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (pinned, never trimmed)
    System,
    /// The AI assistant
    Assistant,
    /// The end user
    User,
    /// Tool execution result
    Tool,
}

impl Role {
    /// The wire-format label for this role.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::Tool => "tool",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

/// An ordered, append-only sequence of messages.
///
/// Index 0 is always the initial assistant greeting. The greeting belongs to
/// the pinned prefix during context assembly; everything after it is
/// trimmable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered messages; index 0 is the greeting
    pub messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation seeded with the given assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: vec![Message::assistant(greeting)],
            created_at: now,
            updated_at: now,
        }
    }

    /// The initial greeting message (index 0).
    pub fn greeting(&self) -> &Message {
        &self.messages[0]
    }

    /// The trimmable portion: everything after the greeting, in order.
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }

    /// Append a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Total number of messages, greeting included.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello there");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello there");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("call_42", "{\"temperature\": 18.5}");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_42"));
    }

    #[test]
    fn conversation_starts_with_greeting() {
        let conv = Conversation::with_greeting("How can I help you?");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.greeting().role, Role::Assistant);
        assert_eq!(conv.greeting().content, "How can I help you?");
        assert!(conv.history().is_empty());
    }

    #[test]
    fn history_excludes_greeting() {
        let mut conv = Conversation::with_greeting("Hi!");
        conv.push(Message::user("What is Rust?"));
        conv.push(Message::assistant("A systems language."));

        assert_eq!(conv.history().len(), 2);
        assert_eq!(conv.history()[0].role, Role::User);
        assert!(conv.updated_at >= conv.created_at);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"user""#));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, "Test message");
        assert_eq!(back.role, Role::User);
    }

    #[test]
    fn role_labels() {
        assert_eq!(Role::System.label(), "system");
        assert_eq!(Role::Assistant.label(), "assistant");
        assert_eq!(Role::User.label(), "user");
        assert_eq!(Role::Tool.label(), "tool");
    }
}
