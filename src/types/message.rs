//! Enriched message types for the conversation history.
//!
//! History entries carry metadata (timestamps, usage, latency) that never
//! reaches the provider; [`crate::history::History::to_wire_format`] strips
//! it down to the provider-facing shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::usage::Usage;

/// A turn in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User(UserMessage),
    System(SystemMessage),
    Assistant(AssistantMessage),
}

impl Message {
    /// Create a user message from plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User(UserMessage {
            content: vec![UserContent::Text { text: text.into() }],
            meta: MessageMeta::now(),
        })
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(SystemMessage {
            content: text.into(),
            meta: MessageMeta::now(),
        })
    }

    /// Create an assistant message from plain text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage {
            content: vec![AssistantContent::Text { text: text.into() }],
            meta: AssistantMeta::now(),
        })
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        match self {
            Self::User(m) => m.meta.sent_at,
            Self::System(m) => m.meta.sent_at,
            Self::Assistant(m) => m.meta.sent_at,
        }
    }
}

/// Metadata envelope for user and system messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageMeta {
    pub sent_at: DateTime<Utc>,
}

impl MessageMeta {
    pub fn now() -> Self {
        Self {
            sent_at: Utc::now(),
        }
    }
}

impl Default for MessageMeta {
    fn default() -> Self {
        Self::now()
    }
}

/// Metadata envelope for assistant messages, with per-turn performance data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMeta {
    pub sent_at: DateTime<Utc>,
    /// Time from request to first streamed fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Wall-clock time for the whole turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AssistantMeta {
    pub fn now() -> Self {
        Self {
            sent_at: Utc::now(),
            latency_ms: None,
            total_time_ms: None,
            usage: None,
            model: None,
        }
    }
}

impl Default for AssistantMeta {
    fn default() -> Self {
        Self::now()
    }
}

/// A user turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMessage {
    pub content: Vec<UserContent>,
    #[serde(default)]
    pub meta: MessageMeta,
}

/// A system turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemMessage {
    pub content: String,
    #[serde(default)]
    pub meta: MessageMeta,
}

/// An assistant turn: interleaved text, tool calls, and tool results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    pub content: Vec<AssistantContent>,
    #[serde(default)]
    pub meta: AssistantMeta,
}

impl AssistantMessage {
    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                AssistantContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool-call items in content order.
    pub fn tool_calls(&self) -> Vec<&ToolCallItem> {
        self.content
            .iter()
            .filter_map(|item| match item {
                AssistantContent::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Whether a result item with the given call id is present.
    pub fn has_result_for(&self, call_id: &str) -> bool {
        self.content.iter().any(|item| {
            matches!(item, AssistantContent::ToolCallResult(r) if r.call_id == call_id)
        })
    }
}

/// One content item of a user turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserContent {
    Text { text: String },
    Image { image_url: String },
}

/// One content item of an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantContent {
    Text { text: String },
    ToolCall(ToolCallItem),
    ToolCallResult(ToolCallResultItem),
}

/// A tool call requested by the model. Arguments stay a raw JSON string
/// until invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallItem {
    pub call_id: String,
    pub name: String,
    pub arguments: String,
}

/// The recorded outcome of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallResultItem {
    pub call_id: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}
