//! Shared test support: scripted fragment streams and event helpers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use agentry::client::{CompletionClient, CompletionRequest, FragmentStream};
use agentry::error::Result;
use agentry::types::{
    FinishReason, FragmentChoice, FragmentDelta, FragmentUsage, StreamFragment, ToolCallFragment,
    ToolCallFunctionFragment,
};

/// Completion client that replays prerecorded fragment scripts, one per turn.
pub struct ScriptedClient {
    turns: Mutex<VecDeque<Vec<StreamFragment>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<Vec<StreamFragment>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion turns requested so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests captured in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<FragmentStream> {
        self.requests.lock().unwrap().push(request);
        let fragments = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }
}

/// First fragment of an assistant turn: role marker plus optional text.
pub fn assistant_start(id: &str, text: &str) -> StreamFragment {
    StreamFragment {
        id: id.to_string(),
        choices: vec![FragmentChoice {
            delta: FragmentDelta {
                role: Some("assistant".to_string()),
                content: (!text.is_empty()).then(|| text.to_string()),
                tool_calls: None,
            },
            ..Default::default()
        }],
        usage: None,
    }
}

/// Content-only continuation fragment.
pub fn text_delta(id: &str, text: &str) -> StreamFragment {
    StreamFragment::content(id, text)
}

/// Fragment opening a new tool call.
pub fn tool_call_open(id: &str, call_id: &str, name: &str, args: &str) -> StreamFragment {
    StreamFragment {
        id: id.to_string(),
        choices: vec![FragmentChoice {
            delta: FragmentDelta {
                tool_calls: Some(vec![ToolCallFragment {
                    id: Some(call_id.to_string()),
                    index: Some(0),
                    function: Some(ToolCallFunctionFragment {
                        name: Some(name.to_string()),
                        arguments: Some(args.to_string()),
                    }),
                }]),
                ..Default::default()
            },
            ..Default::default()
        }],
        usage: None,
    }
}

/// Fragment continuing the call at `index` with more argument text.
pub fn tool_call_continue(id: &str, index: usize, args: &str) -> StreamFragment {
    StreamFragment {
        id: id.to_string(),
        choices: vec![FragmentChoice {
            delta: FragmentDelta {
                tool_calls: Some(vec![ToolCallFragment {
                    id: None,
                    index: Some(index),
                    function: Some(ToolCallFunctionFragment {
                        name: None,
                        arguments: Some(args.to_string()),
                    }),
                }]),
                ..Default::default()
            },
            ..Default::default()
        }],
        usage: None,
    }
}

/// Finish-reason fragment.
pub fn finish(id: &str, reason: FinishReason) -> StreamFragment {
    StreamFragment::finish(id, reason)
}

/// Usage totals fragment (no choices, as providers send it).
pub fn usage(prompt_tokens: u32, completion_tokens: u32) -> StreamFragment {
    StreamFragment {
        id: String::new(),
        choices: Vec::new(),
        usage: Some(FragmentUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }),
    }
}

/// Complete turn: assistant text ending in a plain stop.
pub fn text_turn(id: &str, text: &str) -> Vec<StreamFragment> {
    vec![assistant_start(id, text), finish(id, FinishReason::Stop)]
}

/// Complete turn: one tool call ending in `tool_calls`.
pub fn tool_turn(id: &str, call_id: &str, name: &str, args: &str) -> Vec<StreamFragment> {
    vec![
        assistant_start(id, ""),
        tool_call_open(id, call_id, name, args),
        finish(id, FinishReason::ToolCalls),
    ]
}

