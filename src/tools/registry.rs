//! Name-keyed registry of callable tools.

use std::sync::Arc;

use crate::error::{AgentryError, Result};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolDefinition;

/// Registry consulted by the executor and the orchestrator.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Register a tool. A tool with the same name replaces the old entry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn requires_confirmation(&self, name: &str) -> bool {
        self.get(name)
            .map(|t| t.requires_confirmation())
            .unwrap_or(false)
    }

    /// Provider-facing definitions for every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    /// Invoke a tool by name with a raw arguments string.
    ///
    /// The arguments are parsed as JSON here, at the point of invocation;
    /// malformed JSON is an execution error like any other.
    pub async fn invoke(
        &self,
        name: &str,
        args_json: &str,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentryError::tool(name, "tool not found in registry"))?;
        let args = ToolArguments::parse(args_json)
            .map_err(|e| AgentryError::tool(name, format!("invalid arguments: {e}")))?;
        tool.execute(&args, ctx).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
