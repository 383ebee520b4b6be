//! Incremental reconstruction of an assistant message from stream fragments.
//!
//! One [`StreamProcessor`] serves exactly one completion turn. Fragments must
//! be fed in arrival order; after finalization the processor refuses further
//! input. Unexpected fragment shapes are logged and skipped, never fatal.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AgentryError, Result};
use crate::types::{
    AgentEvent, AssistantTurn, FragmentChoice, StreamFragment, ToolCallFragment, ToolCallItem,
    TurnOutcome, Usage,
};

/// Mutable accumulator for one in-flight tool call.
#[derive(Debug, Clone)]
pub struct PartialToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
    settled: bool,
}

impl PartialToolCall {
    fn into_item(self) -> ToolCallItem {
        ToolCallItem {
            call_id: self.id,
            name: self.name,
            arguments: self.arguments,
        }
    }

    fn as_item(&self) -> ToolCallItem {
        ToolCallItem {
            call_id: self.id.clone(),
            name: self.name.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

/// Mutable accumulator for one assistant turn.
#[derive(Debug, Clone)]
pub struct PartialAssistantMessage {
    pub id: String,
    pub index: u32,
    pub role: String,
    pub content: String,
    pub tool_calls: Vec<PartialToolCall>,
}

/// State machine turning an ordered fragment sequence into [`AgentEvent`]s.
#[derive(Debug, Default)]
pub struct StreamProcessor {
    message: Option<PartialAssistantMessage>,
    finalized: bool,
}

impl StreamProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the turn has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The in-flight accumulator, if initialized.
    pub fn message(&self) -> Option<&PartialAssistantMessage> {
        self.message.as_ref()
    }

    /// Process one fragment, returning the events it produced.
    ///
    /// Calling this after the turn finalized is a programmer error.
    pub fn process(&mut self, fragment: &StreamFragment) -> Result<Vec<AgentEvent>> {
        // Usage fragments bypass the accumulator entirely; providers often
        // send them after the finish fragment.
        if let Some(ref usage) = fragment.usage {
            return Ok(vec![AgentEvent::Usage {
                usage: Usage::new(usage.prompt_tokens, usage.completion_tokens),
            }]);
        }

        // Heartbeat/housekeeping fragments are forwarded for observability.
        let Some(choice) = fragment.choices.first() else {
            return Ok(vec![AgentEvent::RawFragment {
                fragment: fragment.clone(),
            }]);
        };

        if self.finalized {
            return Err(AgentryError::InvalidState(
                "fragment received after turn finalization".to_string(),
            ));
        }

        let mut events = Vec::new();

        if self.message.is_none() {
            match choice.delta.role.as_deref() {
                Some("assistant") => self.initialize(fragment, choice),
                other => {
                    warn!(role = ?other, "skipping fragment before assistant turn start");
                    return Ok(events);
                }
            }
        }

        if let Some(ref content) = choice.delta.content {
            if !content.is_empty() {
                let message = self.message.as_mut().expect("initialized above");
                message.content.push_str(content);
                events.push(AgentEvent::ContentDelta {
                    delta: content.clone(),
                });
            }
        }

        if let Some(ref entries) = choice.delta.tool_calls {
            self.apply_tool_call_deltas(entries, &mut events);
        }

        if choice.finish_reason.is_some() {
            self.finalize(&mut events);
        }

        Ok(events)
    }

    fn initialize(&mut self, fragment: &StreamFragment, choice: &FragmentChoice) {
        let id = if fragment.id.is_empty() {
            format!("msg_{}", Uuid::new_v4().simple())
        } else {
            fragment.id.clone()
        };
        debug!(turn_id = %id, "initialized assistant turn");
        self.message = Some(PartialAssistantMessage {
            id,
            index: choice.index,
            role: "assistant".to_string(),
            content: String::new(),
            tool_calls: Vec::new(),
        });
    }

    fn apply_tool_call_deltas(&mut self, entries: &[ToolCallFragment], events: &mut Vec<AgentEvent>) {
        let message = self.message.as_mut().expect("initialized before deltas");

        for entry in entries {
            match entry.id.as_deref() {
                Some(id) if !id.is_empty() => {
                    Self::settle_last(&mut message.tool_calls, events);
                    message.tool_calls.push(PartialToolCall {
                        id: id.to_string(),
                        name: entry
                            .function
                            .as_ref()
                            .and_then(|f| f.name.clone())
                            .unwrap_or_default(),
                        arguments: entry
                            .function
                            .as_ref()
                            .and_then(|f| f.arguments.clone())
                            .unwrap_or_default(),
                        settled: false,
                    });
                }
                Some(_) => {
                    // Provider opened a call without an id; synthesize one.
                    Self::settle_last(&mut message.tool_calls, events);
                    message.tool_calls.push(PartialToolCall {
                        id: format!("call_{}", Uuid::new_v4().simple()),
                        name: entry
                            .function
                            .as_ref()
                            .and_then(|f| f.name.clone())
                            .unwrap_or_default(),
                        arguments: entry
                            .function
                            .as_ref()
                            .and_then(|f| f.arguments.clone())
                            .unwrap_or_default(),
                        settled: false,
                    });
                }
                None => match entry.index {
                    Some(index) if index < message.tool_calls.len() => {
                        if let Some(ref function) = entry.function {
                            if let Some(ref arguments) = function.arguments {
                                message.tool_calls[index].arguments.push_str(arguments);
                            }
                        }
                    }
                    other => {
                        warn!(index = ?other, "dropping tool-call continuation with invalid index");
                    }
                },
            }
        }

        // Argument deltas are announced against the call most recently
        // created or continued.
        if let Some(last) = message.tool_calls.last() {
            for entry in entries {
                let arguments_delta = entry
                    .function
                    .as_ref()
                    .and_then(|f| f.arguments.as_deref())
                    .unwrap_or_default();
                if !arguments_delta.is_empty() {
                    events.push(AgentEvent::ToolCallDelta {
                        call_id: last.id.clone(),
                        name: last.name.clone(),
                        arguments_delta: arguments_delta.to_string(),
                    });
                }
            }
        }
    }

    fn settle_last(calls: &mut [PartialToolCall], events: &mut Vec<AgentEvent>) {
        if let Some(last) = calls.last_mut() {
            if !last.settled {
                last.settled = true;
                let item = last.as_item();
                events.push(AgentEvent::ToolCall {
                    call_id: item.call_id,
                    name: item.name,
                    arguments: item.arguments,
                });
            }
        }
    }

    fn finalize(&mut self, events: &mut Vec<AgentEvent>) {
        let mut message = self.message.take().expect("initialized before finalization");
        Self::settle_last(&mut message.tool_calls, events);

        let outcome = if message.tool_calls.is_empty() {
            TurnOutcome::Stop
        } else {
            TurnOutcome::ToolCallsPending
        };

        debug!(
            turn_id = %message.id,
            tool_calls = message.tool_calls.len(),
            text_len = message.content.len(),
            ?outcome,
            "finalized assistant turn"
        );

        events.push(AgentEvent::AssistantMessage {
            turn: AssistantTurn {
                id: message.id,
                index: message.index,
                role: message.role,
                content: message.content,
                tool_calls: message
                    .tool_calls
                    .into_iter()
                    .map(PartialToolCall::into_item)
                    .collect(),
            },
            outcome,
        });
        self.finalized = true;
    }
}
