//! Domain events emitted while a turn streams and its tools execute.

use serde::{Deserialize, Serialize};

use super::fragment::StreamFragment;
use super::message::ToolCallItem;
use super::usage::Usage;

/// A finalized assistant turn as reconstructed from the stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantTurn {
    /// Provider-assigned turn id (or a synthesized one).
    pub id: String,
    pub index: u32,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallItem>,
}

/// Terminal state of a completion turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The model finished with no tool calls outstanding.
    Stop,
    /// The model finished by requesting one or more tool calls.
    ToolCallsPending,
}

/// Events produced by the stream processor and the tool executor.
///
/// Events are transient: forwarded to the caller, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Unmodified provider fragment, forwarded for observability.
    RawFragment { fragment: StreamFragment },
    Usage { usage: Usage },
    /// Incremental text; carries exactly the delta, never cumulative text.
    ContentDelta { delta: String },
    /// Incremental tool-call arguments for the most recently touched call.
    ToolCallDelta {
        call_id: String,
        name: String,
        arguments_delta: String,
    },
    /// A settled (or about-to-execute) tool call with its arguments so far.
    ToolCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    /// The finalized assistant message for the turn, emitted exactly once.
    AssistantMessage {
        turn: AssistantTurn,
        outcome: TurnOutcome,
    },
    /// Result of one tool invocation.
    ToolCallOutput {
        call_id: String,
        name: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution_time_ms: Option<u64>,
    },
}

impl AgentEvent {
    pub fn event_type(&self) -> AgentEventType {
        match self {
            Self::RawFragment { .. } => AgentEventType::RawFragment,
            Self::Usage { .. } => AgentEventType::Usage,
            Self::ContentDelta { .. } => AgentEventType::ContentDelta,
            Self::ToolCallDelta { .. } => AgentEventType::ToolCallDelta,
            Self::ToolCall { .. } => AgentEventType::ToolCall,
            Self::AssistantMessage { .. } => AgentEventType::AssistantMessage,
            Self::ToolCallOutput { .. } => AgentEventType::ToolCallOutput,
        }
    }
}

/// Event discriminator, used for include-filtering on runner streams.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentEventType {
    RawFragment,
    Usage,
    ContentDelta,
    ToolCallDelta,
    ToolCall,
    AssistantMessage,
    ToolCallOutput,
}

impl AgentEventType {
    /// Every event type except the raw fragment passthrough.
    pub fn default_includes() -> Vec<AgentEventType> {
        vec![
            Self::Usage,
            Self::ContentDelta,
            Self::ToolCallDelta,
            Self::ToolCall,
            Self::AssistantMessage,
            Self::ToolCallOutput,
        ]
    }
}
