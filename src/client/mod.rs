//! Completion client abstraction.
//!
//! The orchestration core never talks to a provider directly; it consumes a
//! [`CompletionClient`] as a source of ordered [`StreamFragment`]s for one
//! turn.

pub mod http;
pub mod openai;

pub use openai::OpenAiChatClient;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::tools::ToolDefinition;
use crate::types::StreamFragment;

/// Ordered fragment stream for one completion turn.
pub type FragmentStream = BoxStream<'static, Result<StreamFragment>>;

/// One completion request: wire-format messages plus tool definitions.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<serde_json::Value>,
    pub tools: Vec<ToolDefinition>,
}

/// Source of streamed completion fragments.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<FragmentStream>;
}
