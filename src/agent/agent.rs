//! Agent descriptor: model binding, instructions, tools, and handoff graph.

use std::sync::{Arc, RwLock, Weak};

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::json;

use crate::client::{CompletionClient, CompletionRequest, OpenAiChatClient};
use crate::config::AgentryConfig;
use crate::error::Result;
use crate::history::History;
use crate::stream::StreamProcessor;
use crate::tools::{FunctionTool, Tool, ToolDefinition, ToolParameters, ToolRegistry};
use crate::transcript::TranscriptWriter;
use crate::types::AgentEvent;

/// Control-plane tool name for transferring to a named handoff target.
pub const TRANSFER_TO_AGENT: &str = "transfer_to_agent";
/// Control-plane tool name for transferring back to the parent agent.
pub const TRANSFER_TO_PARENT: &str = "transfer_to_parent";
/// Sentinel tool the model calls to declare its task complete.
pub const TASK_DONE: &str = "task_done";
/// Sentinel tool the model calls to hand control back to the user.
pub const WAIT_FOR_USER: &str = "wait_for_user";

/// Stream of domain events for one completion turn.
pub type EventStream = BoxStream<'static, Result<AgentEvent>>;

/// When a run is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Finish when the provider reports a plain stop with no tool calls.
    #[default]
    StopOnFinish,
    /// Finish only when the model calls a sentinel tool
    /// ([`TASK_DONE`] / [`WAIT_FOR_USER`]); a plain stop loops again.
    StopOnToolCall,
}

/// A configured agent: identity, model, instructions, and tool set.
pub struct Agent {
    name: String,
    model: String,
    instructions: String,
    registry: ToolRegistry,
    completion_policy: CompletionPolicy,
    client: Arc<dyn CompletionClient>,
    handoffs: RwLock<Vec<Arc<Agent>>>,
    parent: RwLock<Option<Weak<Agent>>>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        instructions: impl Into<String>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instructions: instructions.into(),
            registry: ToolRegistry::new(),
            completion_policy: CompletionPolicy::StopOnFinish,
            client,
            handoffs: RwLock::new(Vec::new()),
            parent: RwLock::new(None),
        }
    }

    /// Create an agent backed by the default OpenAI-style client, with
    /// credentials from the global config.
    pub fn openai(
        name: impl Into<String>,
        model: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Result<Self> {
        let client = OpenAiChatClient::from_config(AgentryConfig::global())?;
        Ok(Self::new(name, model, instructions, Arc::new(client)))
    }

    /// Add a tool.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.registry.register(tool);
        self
    }

    /// Add several tools.
    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.registry.register(tool);
        }
        self
    }

    /// Set the completion policy. `StopOnToolCall` registers the sentinel
    /// tools so the model has something to call.
    pub fn with_completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.completion_policy = policy;
        if policy == CompletionPolicy::StopOnToolCall {
            self.registry.register(Arc::new(task_done_tool()));
            self.registry.register(Arc::new(wait_for_user_tool()));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn completion_policy(&self) -> CompletionPolicy {
        self.completion_policy
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Declared handoff targets.
    pub fn handoffs(&self) -> Vec<Arc<Agent>> {
        self.handoffs.read().unwrap().clone()
    }

    /// Parent back-reference, if this agent was registered as a handoff.
    pub fn parent(&self) -> Option<Arc<Agent>> {
        self.parent.read().unwrap().as_ref().and_then(Weak::upgrade)
    }

    /// Register `target` as a handoff of `parent`, wiring the parent
    /// back-reference on the target.
    pub fn register_handoff(parent: &Arc<Agent>, target: Arc<Agent>) {
        *target.parent.write().unwrap() = Some(Arc::downgrade(parent));
        parent.handoffs.write().unwrap().push(target);
    }

    /// Resolve a transfer target by name: own handoffs first, then each
    /// ancestor's handoff set (sibling transfer).
    pub fn find_handoff(&self, name: &str) -> Option<Arc<Agent>> {
        if let Some(target) = self
            .handoffs
            .read()
            .unwrap()
            .iter()
            .find(|h| h.name() == name)
        {
            return Some(target.clone());
        }
        let mut ancestor = self.parent();
        while let Some(agent) = ancestor {
            if let Some(target) = agent
                .handoffs
                .read()
                .unwrap()
                .iter()
                .find(|h| h.name() == name)
            {
                return Some(target.clone());
            }
            ancestor = agent.parent();
        }
        None
    }

    /// System prompt sent as the first wire message.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!("You are {}. {}", self.name, self.instructions);
        if self.completion_policy == CompletionPolicy::StopOnToolCall {
            prompt.push_str(
                "\n\nWhen you have completed your assigned task, call the `task_done` function. \
                 If you need additional input from the user, call the `wait_for_user` function.",
            );
        }
        prompt
    }

    /// Tool definitions sent to the provider: the registry plus the
    /// control-plane transfer tools derived from the handoff graph.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.registry.definitions();

        let handoff_names: Vec<String> = self
            .handoffs
            .read()
            .unwrap()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        if !handoff_names.is_empty() {
            let names: Vec<&str> = handoff_names.iter().map(String::as_str).collect();
            definitions.push(ToolDefinition {
                name: TRANSFER_TO_AGENT.to_string(),
                description: "Transfer the conversation to another agent".to_string(),
                parameters: ToolParameters::object()
                    .string_enum("name", "Name of the agent to transfer to", &names, true)
                    .build()
                    .schema,
            });
        }
        if self.parent().is_some() {
            definitions.push(ToolDefinition {
                name: TRANSFER_TO_PARENT.to_string(),
                description: "Transfer the conversation back to the parent agent".to_string(),
                parameters: ToolParameters::empty().schema,
            });
        }

        definitions
    }

    /// Run one completion turn against the current history.
    ///
    /// Fragments are recorded to the optional transcript sink before they hit
    /// the processor; the returned stream yields the processor's events.
    pub async fn completion(
        &self,
        history: &History,
        record: Option<Arc<TranscriptWriter>>,
    ) -> Result<EventStream> {
        let mut messages = vec![json!({
            "role": "system",
            "content": self.system_prompt(),
        })];
        messages.extend(history.to_wire_format());

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            tools: self.tool_definitions(),
        };
        let fragments = self.client.complete(request).await?;

        let stream = async_stream::try_stream! {
            let mut processor = StreamProcessor::new();
            let mut fragments = fragments;
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                if let Some(ref sink) = record {
                    sink.record(&fragment).await;
                }
                for event in processor.process(&fragment)? {
                    yield event;
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.registry.names())
            .field("handoffs", &self.handoffs.read().unwrap().len())
            .finish()
    }
}

fn task_done_tool() -> FunctionTool {
    FunctionTool::new(
        TASK_DONE,
        "Call this function when you have completed your assigned task",
        ToolParameters::object()
            .string("summary", "Short summary of what was accomplished", false)
            .build(),
        |args, _ctx| async move {
            let content = match args.get_str_opt("summary") {
                Some(summary) => format!("Task completed. {summary}"),
                None => "Task completed.".to_string(),
            };
            Ok(serde_json::Value::String(content))
        },
    )
}

fn wait_for_user_tool() -> FunctionTool {
    FunctionTool::new(
        WAIT_FOR_USER,
        "Call this function when you need additional input from the user",
        ToolParameters::object()
            .string("message", "What you need from the user", false)
            .build(),
        |args, _ctx| async move {
            let content = match args.get_str_opt("message") {
                Some(message) => format!("Waiting for user input. {message}"),
                None => "Waiting for user input.".to_string(),
            };
            Ok(serde_json::Value::String(content))
        },
    )
}
