//! Sequential execution of finalized tool-call batches.
//!
//! Execution errors are data, not control flow: a failing tool produces an
//! output event carrying the error text, and the batch continues. Only a
//! name missing from the registry is skipped outright.

use std::time::Instant;

use tracing::{error, warn};

use crate::types::{AgentEvent, ToolCallItem};

use super::registry::ToolRegistry;
use super::tool::ToolExecutionContext;

/// Execute a batch of tool calls in request order.
///
/// Emits a `ToolCall`/`ToolCallOutput` pair per executed call. Calls whose
/// name is not registered produce no events at all.
pub async fn execute_tool_calls(registry: &ToolRegistry, calls: &[ToolCallItem]) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    for call in calls {
        if !registry.has(&call.name) {
            warn!(name = %call.name, call_id = %call.call_id, "tool not found in registry, skipping call");
            continue;
        }

        events.push(AgentEvent::ToolCall {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        let ctx = ToolExecutionContext {
            tool_call_id: Some(call.call_id.clone()),
            tool_name: Some(call.name.clone()),
        };
        let started = Instant::now();
        let content = match registry.invoke(&call.name, &call.arguments, &ctx).await {
            Ok(value) => stringify_result(value),
            Err(e) => {
                error!(call_id = %call.call_id, name = %call.name, error = %e, "tool call failed");
                e.to_string()
            }
        };
        let execution_time_ms = started.elapsed().as_millis() as u64;

        events.push(AgentEvent::ToolCallOutput {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            content,
            execution_time_ms: Some(execution_time_ms),
        });
    }
    events
}

/// Flatten a tool's return value to the string the model will see.
pub fn stringify_result(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
