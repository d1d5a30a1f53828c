use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    System,
    Assistant,
    Tool,
}

/// Immutable payload threaded through every topic event.
///
/// Equality is structural: two messages with identical fields (including
/// `message_id`) compare equal, but `message_id` is generated fresh for
/// every new message so distinct messages never collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_calls: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub function_call: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub functions: Option<Value>,
    /// `true` iff this message is a partial content fragment. The only
    /// discriminator aggregation uses — see [`crate::aggregate`].
    #[serde(default)]
    pub is_streaming: bool,
}

impl Message {
    /// Build a non-streaming message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            role,
            content: Some(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
            function_call: None,
            functions: None,
            is_streaming: false,
        }
    }

    /// Build a streaming content fragment.
    pub fn streaming_fragment(role: Role, content: impl Into<String>) -> Self {
        Self {
            is_streaming: true,
            ..Self::new(role, content)
        }
    }
}

pub type Messages = Vec<Message>;
