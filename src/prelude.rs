//! Convenience re-exports for common use.

pub use crate::agent::{Agent, CompletionPolicy};
pub use crate::client::{CompletionClient, CompletionRequest, OpenAiChatClient};
pub use crate::config::AgentryConfig;
pub use crate::error::{AgentryError, Result};
pub use crate::history::History;
pub use crate::runner::{ConfirmDecision, RunState, Runner, UserInput};
pub use crate::tools::{FunctionTool, Tool, ToolArguments, ToolParameters, ToolRegistry};
pub use crate::transcript::TranscriptWriter;
pub use crate::types::{
    AgentEvent, AgentEventType, AssistantTurn, Message, StreamFragment, TurnOutcome, Usage,
};
