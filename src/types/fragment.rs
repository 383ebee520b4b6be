//! Low-level stream fragment types.
//!
//! A [`StreamFragment`] is one unit of the provider's streamed output for a
//! completion turn, mirroring the chat-completions chunk wire shape. The
//! processor consumes fragments in arrival order; nothing here is reordered
//! or deduplicated.

use serde::{Deserialize, Serialize};

/// One streamed chunk from the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StreamFragment {
    /// Provider-assigned response id; shared by all fragments of one turn.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub choices: Vec<FragmentChoice>,
    /// Token totals, typically carried only by the final fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<FragmentUsage>,
}

/// A single choice within a fragment.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FragmentChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: FragmentDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Incremental payload of one choice.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FragmentDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallFragment>>,
}

/// One tool-call delta entry.
///
/// An entry carrying an `id` opens a new call; an entry without one continues
/// the call at `index`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ToolCallFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ToolCallFunctionFragment>,
}

/// Function payload of a tool-call delta entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ToolCallFunctionFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Usage totals as carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FragmentUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Why the provider ended the turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
}

impl StreamFragment {
    /// Fragment carrying only a text delta.
    pub fn content(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            choices: vec![FragmentChoice {
                delta: FragmentDelta {
                    content: Some(text.into()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            usage: None,
        }
    }

    /// Fragment carrying a finish reason.
    pub fn finish(id: impl Into<String>, reason: FinishReason) -> Self {
        Self {
            id: id.into(),
            choices: vec![FragmentChoice {
                finish_reason: Some(reason),
                ..Default::default()
            }],
            usage: None,
        }
    }
}
