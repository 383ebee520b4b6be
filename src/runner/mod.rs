//! Step-loop orchestrator.
//!
//! The [`Runner`] owns the canonical [`History`] and drives repeated
//! completion turns against the active [`Agent`]: stream a turn, append the
//! finalized assistant message, execute pending tool calls, repeat until the
//! termination policy is satisfied or the step budget runs out. Everything is
//! single-threaded and cooperative; the only suspension points are the
//! fragment stream and the explicit confirmation gate.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::agent::{
    Agent, CompletionPolicy, TASK_DONE, TRANSFER_TO_AGENT, TRANSFER_TO_PARENT, WAIT_FOR_USER,
};
use crate::error::Result;
use crate::history::History;
use crate::tools::execute_tool_calls;
use crate::transcript::TranscriptWriter;
use crate::types::{
    AgentEvent, AgentEventType, AssistantContent, AssistantMessage, AssistantMeta, AssistantTurn,
    Message, ToolCallItem, ToolCallResultItem, TurnOutcome, Usage,
};

/// Default completion-turn budget per run.
pub const DEFAULT_MAX_STEPS: usize = 20;

/// Orchestrator state over one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    AwaitingCompletion,
    ExecutingTools,
    AwaitingConfirmation,
    Done,
}

/// Caller's verdict when resuming a confirmation-gated batch.
///
/// Both verdicts re-enter tool execution; what "decline" means beyond that is
/// a caller concern (e.g. editing history first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Proceed,
    Decline,
}

/// Input accepted by [`Runner::run`].
pub enum UserInput {
    /// Appended as a user message.
    Text(String),
    /// A loose message record, appended after normalization.
    Message(serde_json::Value),
    /// A full message list; replaces the current history.
    Messages(Vec<serde_json::Value>),
}

impl From<&str> for UserInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for UserInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for UserInput {
    fn from(value: serde_json::Value) -> Self {
        Self::Message(value)
    }
}

impl From<Vec<serde_json::Value>> for UserInput {
    fn from(values: Vec<serde_json::Value>) -> Self {
        Self::Messages(values)
    }
}

/// Stream of run events borrowed from the runner.
pub type RunStream<'a> = BoxStream<'a, Result<AgentEvent>>;

/// Drives the conversation loop for one agent tree.
pub struct Runner {
    agent: Arc<Agent>,
    history: History,
    state: RunState,
    max_steps: usize,
    includes: Vec<AgentEventType>,
    transcript: Option<Arc<TranscriptWriter>>,
    pending_confirmation: Vec<ToolCallItem>,
}

impl Runner {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            history: History::new(),
            state: RunState::Idle,
            max_steps: DEFAULT_MAX_STEPS,
            includes: AgentEventType::default_includes(),
            transcript: None,
            pending_confirmation: Vec::new(),
        }
    }

    /// Set the completion-turn budget per run.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Restrict which event types the run streams yield.
    pub fn with_includes(mut self, includes: Vec<AgentEventType>) -> Self {
        self.includes = includes;
        self
    }

    /// Record every raw fragment to a transcript sink.
    pub fn with_transcript(mut self, transcript: Arc<TranscriptWriter>) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// The currently active agent.
    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Calls deferred at the confirmation gate.
    pub fn pending_confirmation(&self) -> &[ToolCallItem] {
        &self.pending_confirmation
    }

    /// Start a run with new input.
    ///
    /// Input normalization failures (a record with neither a `role` nor a
    /// `type`) are raised here, before any turn is attempted.
    pub fn run(&mut self, input: impl Into<UserInput>) -> Result<RunStream<'_>> {
        match input.into() {
            UserInput::Text(text) => self.history.push(Message::user(text)),
            UserInput::Message(value) => self.history.append(value)?,
            UserInput::Messages(values) => {
                self.history.clear();
                for value in values {
                    self.history.append(value)?;
                }
            }
        }
        Ok(self.drive(None))
    }

    /// Continue the loop over the existing history, with no new input.
    pub fn run_continue(&mut self) -> RunStream<'_> {
        self.drive(None)
    }

    /// Resume after a confirmation suspension.
    pub fn resume(&mut self, decision: ConfirmDecision) -> RunStream<'_> {
        self.drive(Some(decision))
    }

    /// Run to completion, collecting every yielded event.
    pub async fn run_until_complete(
        &mut self,
        input: impl Into<UserInput>,
    ) -> Result<Vec<AgentEvent>> {
        let mut events = Vec::new();
        {
            let mut stream = self.run(input)?;
            while let Some(event) = stream.next().await {
                events.push(event?);
            }
        }
        Ok(events)
    }

    fn drive(&mut self, resume: Option<ConfirmDecision>) -> RunStream<'_> {
        Box::pin(async_stream::stream! {
            if let Some(decision) = resume {
                if self.state != RunState::AwaitingConfirmation {
                    warn!(state = ?self.state, "resume called outside a confirmation suspension");
                    return;
                }
                debug!(?decision, calls = self.pending_confirmation.len(), "resuming deferred batch");
                self.state = RunState::ExecutingTools;
                let calls = std::mem::take(&mut self.pending_confirmation);
                let (events, sentinel) = self.execute_batch(calls).await;
                for event in events {
                    if self.includes.contains(&event.event_type()) {
                        yield Ok(event);
                    }
                }
                if sentinel {
                    self.state = RunState::Done;
                    return;
                }
            }

            self.state = RunState::AwaitingCompletion;
            let mut steps = 0usize;

            while steps < self.max_steps {
                steps += 1;
                let turn_started = Instant::now();

                let stream = match self
                    .agent
                    .completion(&self.history, self.transcript.clone())
                    .await
                {
                    Ok(stream) => stream,
                    Err(e) => {
                        self.state = RunState::Done;
                        yield Err(e);
                        return;
                    }
                };

                let mut first_event_at: Option<Instant> = None;
                let mut turn_usage: Option<Usage> = None;
                let mut finalized: Option<(AssistantTurn, TurnOutcome)> = None;

                let mut stream = stream;
                while let Some(event) = stream.next().await {
                    let event = match event {
                        Ok(event) => event,
                        Err(e) => {
                            self.state = RunState::Done;
                            yield Err(e);
                            return;
                        }
                    };
                    first_event_at.get_or_insert_with(Instant::now);
                    match &event {
                        AgentEvent::Usage { usage } => turn_usage = Some(usage.clone()),
                        AgentEvent::AssistantMessage { turn, outcome } => {
                            finalized = Some((turn.clone(), *outcome));
                        }
                        _ => {}
                    }
                    if self.includes.contains(&event.event_type()) {
                        yield Ok(event);
                    }
                }
                drop(stream);

                // An upstream stream that ends without a finish reason leaves
                // history mid-turn but consistent; nothing to roll back.
                let Some((turn, outcome)) = finalized else {
                    warn!("completion stream ended without finalization");
                    self.state = RunState::Done;
                    return;
                };

                self.append_assistant_turn(&turn, turn_started, first_event_at, turn_usage);

                match outcome {
                    TurnOutcome::Stop => match self.agent.completion_policy() {
                        CompletionPolicy::StopOnFinish => {
                            self.state = RunState::Done;
                            return;
                        }
                        // Under a sentinel policy a plain stop just loops.
                        CompletionPolicy::StopOnToolCall => continue,
                    },
                    TurnOutcome::ToolCallsPending => {
                        self.state = RunState::ExecutingTools;
                        let pending = self.history.find_pending_tool_calls();

                        if pending
                            .iter()
                            .any(|call| self.agent.registry().requires_confirmation(&call.name))
                        {
                            debug!(calls = pending.len(), "batch requires confirmation, suspending");
                            self.pending_confirmation = pending;
                            self.state = RunState::AwaitingConfirmation;
                            return;
                        }

                        let (events, sentinel) = self.execute_batch(pending).await;
                        for event in events {
                            if self.includes.contains(&event.event_type()) {
                                yield Ok(event);
                            }
                        }
                        if sentinel {
                            self.state = RunState::Done;
                            return;
                        }
                        self.state = RunState::AwaitingCompletion;
                    }
                }
            }

            // Step budget exhausted: silent termination by design.
            debug!(max_steps = self.max_steps, "step budget exhausted");
            self.state = RunState::Done;
        })
    }

    fn append_assistant_turn(
        &mut self,
        turn: &AssistantTurn,
        turn_started: Instant,
        first_event_at: Option<Instant>,
        usage: Option<Usage>,
    ) {
        let mut content = Vec::new();
        if !turn.content.is_empty() {
            content.push(AssistantContent::Text {
                text: turn.content.clone(),
            });
        }
        for call in &turn.tool_calls {
            content.push(AssistantContent::ToolCall(call.clone()));
        }
        let meta = AssistantMeta {
            sent_at: chrono::Utc::now(),
            latency_ms: first_event_at
                .map(|at| at.duration_since(turn_started).as_millis() as u64),
            total_time_ms: Some(turn_started.elapsed().as_millis() as u64),
            usage,
            model: Some(self.agent.model().to_string()),
        };
        self.history
            .push(Message::Assistant(AssistantMessage { content, meta }));
    }

    /// Execute one pending batch sequentially, appending each result to
    /// history. Returns the produced events and whether a sentinel tool ran.
    async fn execute_batch(&mut self, calls: Vec<ToolCallItem>) -> (Vec<AgentEvent>, bool) {
        let mut events = Vec::new();
        let mut transferred = false;
        let mut sentinel = false;

        for call in &calls {
            if call.name == TRANSFER_TO_AGENT || call.name == TRANSFER_TO_PARENT {
                let content = if transferred {
                    "Transfer already executed in this batch; call skipped.".to_string()
                } else {
                    let (content, swapped) = self.handle_transfer(call);
                    if swapped {
                        transferred = true;
                    }
                    content
                };
                events.push(self.record_synthetic_output(call, content));
                continue;
            }

            if transferred {
                // Only the transfer runs; the rest of the batch still needs
                // outputs so the next completion request stays valid.
                events.push(self.record_synthetic_output(
                    call,
                    "Call skipped: conversation was transferred to another agent.".to_string(),
                ));
                continue;
            }

            let call_events =
                execute_tool_calls(self.agent.registry(), std::slice::from_ref(call)).await;
            for event in call_events {
                if let AgentEvent::ToolCallOutput {
                    call_id,
                    content,
                    execution_time_ms,
                    ..
                } = &event
                {
                    self.history.attach_tool_result(ToolCallResultItem {
                        call_id: call_id.clone(),
                        output: content.clone(),
                        execution_time_ms: *execution_time_ms,
                    });
                }
                events.push(event);
            }

            if self.agent.completion_policy() == CompletionPolicy::StopOnToolCall
                && (call.name == TASK_DONE || call.name == WAIT_FOR_USER)
            {
                sentinel = true;
            }
        }

        (events, sentinel)
    }

    fn record_synthetic_output(&mut self, call: &ToolCallItem, content: String) -> AgentEvent {
        self.history.attach_tool_result(ToolCallResultItem {
            call_id: call.call_id.clone(),
            output: content.clone(),
            execution_time_ms: None,
        });
        AgentEvent::ToolCallOutput {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            content,
            execution_time_ms: None,
        }
    }

    /// Resolve and apply a transfer call. Returns the result content and
    /// whether the active agent changed.
    fn handle_transfer(&mut self, call: &ToolCallItem) -> (String, bool) {
        if call.name == TRANSFER_TO_PARENT {
            return match self.agent.parent() {
                Some(parent) => {
                    let name = parent.name().to_string();
                    debug!(from = self.agent.name(), to = %name, "transferring to parent agent");
                    self.agent = parent;
                    (format!("Transferring back to parent agent: {name}"), true)
                }
                None => {
                    warn!(agent = self.agent.name(), "transfer_to_parent with no parent configured");
                    ("Cannot transfer: no parent agent configured.".to_string(), false)
                }
            };
        }

        let target_name = serde_json::from_str::<serde_json::Value>(&call.arguments)
            .ok()
            .and_then(|v| v.get("name").and_then(|n| n.as_str().map(str::to_string)));
        let Some(target_name) = target_name else {
            warn!(call_id = %call.call_id, "transfer_to_agent with malformed arguments");
            return (
                "Transfer failed: missing agent name in arguments.".to_string(),
                false,
            );
        };

        if let Some(target) = self.agent.find_handoff(&target_name) {
            debug!(from = self.agent.name(), to = %target_name, "transferring to agent");
            self.agent = target;
            return (format!("Transferring to agent: {target_name}"), true);
        }

        if self.agent.handoffs().is_empty() {
            warn!(agent = self.agent.name(), "transfer requested but no handoffs configured");
            return (
                format!(
                    "Cannot transfer: no handoffs configured for agent {}.",
                    self.agent.name()
                ),
                false,
            );
        }

        let available: Vec<String> = self
            .agent
            .handoffs()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        warn!(target = %target_name, "transfer target not found in handoffs");
        (
            format!(
                "Agent '{}' not found in handoffs. Available agents: {}",
                target_name,
                available.join(", ")
            ),
            false,
        )
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("agent", &self.agent.name())
            .field("state", &self.state)
            .field("history_len", &self.history.len())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}
