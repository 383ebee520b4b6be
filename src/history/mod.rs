//! Canonical conversation history.
//!
//! The history owns the ordered list of enriched turns and converts between
//! that form and the provider-facing wire format. Tool calls and their
//! results are not separate top-level entries: they live as ordered content
//! items inside the assistant turn that produced them.

use serde_json::{json, Value};
use tracing::warn;

use crate::error::{AgentryError, Result};
use crate::types::{
    AssistantContent, AssistantMessage, AssistantMeta, Message, MessageMeta, SystemMessage,
    ToolCallItem, ToolCallResultItem, UserContent, UserMessage,
};

/// Ordered log of conversation turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Append a typed message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the whole history with typed messages.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Append a loosely-typed record, normalizing it into a typed message.
    ///
    /// The record must carry a `role` or `type` discriminator; anything else
    /// is a hard validation error.
    pub fn append(&mut self, value: Value) -> Result<()> {
        let Some(object) = value.as_object() else {
            return Err(AgentryError::InvalidMessage(
                "message must be a JSON object".to_string(),
            ));
        };

        if let Some(role) = object.get("role").and_then(Value::as_str) {
            return self.append_by_role(role, &value);
        }
        if let Some(kind) = object.get("type").and_then(Value::as_str) {
            return self.append_by_type(kind, &value);
        }

        Err(AgentryError::InvalidMessage(
            "message has neither a role nor a type discriminator".to_string(),
        ))
    }

    fn append_by_role(&mut self, role: &str, value: &Value) -> Result<()> {
        match role {
            "user" => {
                let content = parse_user_content(value.get("content"));
                self.messages.push(Message::User(UserMessage {
                    content,
                    meta: MessageMeta::now(),
                }));
                Ok(())
            }
            "system" => {
                let content = value
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.messages.push(Message::System(SystemMessage {
                    content,
                    meta: MessageMeta::now(),
                }));
                Ok(())
            }
            "assistant" => {
                let mut content = Vec::new();
                if let Some(text) = value.get("content").and_then(Value::as_str) {
                    if !text.is_empty() {
                        content.push(AssistantContent::Text {
                            text: text.to_string(),
                        });
                    }
                }
                if let Some(calls) = value.get("tool_calls").and_then(Value::as_array) {
                    for call in calls {
                        content.push(AssistantContent::ToolCall(parse_wire_tool_call(call)?));
                    }
                }
                self.messages.push(Message::Assistant(AssistantMessage {
                    content,
                    meta: AssistantMeta::now(),
                }));
                Ok(())
            }
            // Chat-completions style tool result.
            "tool" => {
                let call_id = value
                    .get("tool_call_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let output = value
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.attach_tool_result(ToolCallResultItem {
                    call_id,
                    output,
                    execution_time_ms: None,
                });
                Ok(())
            }
            other => Err(AgentryError::InvalidMessage(format!(
                "unsupported message role: {other}"
            ))),
        }
    }

    fn append_by_type(&mut self, kind: &str, value: &Value) -> Result<()> {
        match kind {
            "function_call" => {
                self.attach_tool_call(ToolCallItem {
                    call_id: string_field(value, "call_id"),
                    name: string_field(value, "name"),
                    arguments: string_field(value, "arguments"),
                });
                Ok(())
            }
            "function_call_output" => {
                self.attach_tool_result(ToolCallResultItem {
                    call_id: string_field(value, "call_id"),
                    output: string_field(value, "output"),
                    execution_time_ms: None,
                });
                Ok(())
            }
            other => Err(AgentryError::InvalidMessage(format!(
                "unsupported message type: {other}"
            ))),
        }
    }

    /// Attach a tool call to the open assistant turn, creating a synthetic
    /// turn if none is open.
    pub fn attach_tool_call(&mut self, item: ToolCallItem) {
        self.attach(AssistantContent::ToolCall(item));
    }

    /// Attach a tool result to the open assistant turn, creating a synthetic
    /// turn if none is open.
    pub fn attach_tool_result(&mut self, item: ToolCallResultItem) {
        self.attach(AssistantContent::ToolCallResult(item));
    }

    fn attach(&mut self, item: AssistantContent) {
        if let Some(Message::Assistant(open)) = self.messages.last_mut() {
            open.content.push(item);
            return;
        }
        self.messages.push(Message::Assistant(AssistantMessage {
            content: vec![item],
            meta: AssistantMeta::now(),
        }));
    }

    /// Flatten the enriched history into the provider-facing wire shape.
    ///
    /// Exact inverse of the merge rule: an assistant turn becomes one
    /// assistant entry listing its tool calls, followed by one
    /// `function_call_output` entry per result.
    pub fn to_wire_format(&self) -> Vec<Value> {
        let mut wire = Vec::new();
        for message in &self.messages {
            match message {
                Message::User(user) => wire.push(user_to_wire(user)),
                Message::System(system) => wire.push(json!({
                    "role": "system",
                    "content": system.content,
                })),
                Message::Assistant(assistant) => {
                    let text = assistant.text();
                    let calls = assistant.tool_calls();
                    let mut entry = json!({
                        "role": "assistant",
                        "content": if text.is_empty() { Value::Null } else { Value::String(text) },
                    });
                    if !calls.is_empty() {
                        entry["tool_calls"] = Value::Array(
                            calls
                                .iter()
                                .map(|call| {
                                    json!({
                                        "id": call.call_id,
                                        "type": "function",
                                        "function": {
                                            "name": call.name,
                                            "arguments": call.arguments,
                                        },
                                    })
                                })
                                .collect(),
                        );
                    }
                    wire.push(entry);
                    for item in &assistant.content {
                        if let AssistantContent::ToolCallResult(result) = item {
                            wire.push(json!({
                                "type": "function_call_output",
                                "call_id": result.call_id,
                                "output": result.output,
                            }));
                        }
                    }
                }
            }
        }
        wire
    }

    /// Tool calls in the trailing assistant turn that have no same-id result.
    ///
    /// Only the most recent assistant turn is examined; once any other turn
    /// follows it, nothing is pending.
    pub fn find_pending_tool_calls(&self) -> Vec<ToolCallItem> {
        let Some(Message::Assistant(last)) = self.messages.last() else {
            return Vec::new();
        };
        last.tool_calls()
            .into_iter()
            .filter(|call| !last.has_result_for(&call.call_id))
            .cloned()
            .collect()
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_user_content(content: Option<&Value>) -> Vec<UserContent> {
    match content {
        Some(Value::String(text)) => vec![UserContent::Text { text: text.clone() }],
        Some(Value::Array(items)) => {
            let mut parsed = Vec::new();
            for item in items {
                match item.get("type").and_then(Value::as_str) {
                    Some("text") | Some("input_text") => parsed.push(UserContent::Text {
                        text: string_field(item, "text"),
                    }),
                    Some("image_url") => {
                        let url = item
                            .get("image_url")
                            .and_then(|v| v.get("url"))
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        parsed.push(UserContent::Image { image_url: url });
                    }
                    Some("image") | Some("input_image") => parsed.push(UserContent::Image {
                        image_url: string_field(item, "image_url"),
                    }),
                    other => {
                        warn!(item_type = ?other, "skipping unrecognized user content item");
                    }
                }
            }
            parsed
        }
        _ => Vec::new(),
    }
}

fn parse_wire_tool_call(call: &Value) -> Result<ToolCallItem> {
    let function = call.get("function").ok_or_else(|| {
        AgentryError::InvalidMessage("assistant tool_calls entry missing function".to_string())
    })?;
    Ok(ToolCallItem {
        call_id: string_field(call, "id"),
        name: string_field(function, "name"),
        arguments: string_field(function, "arguments"),
    })
}

fn user_to_wire(user: &UserMessage) -> Value {
    if user.content.len() == 1 {
        if let UserContent::Text { text } = &user.content[0] {
            return json!({ "role": "user", "content": text });
        }
    }
    let items: Vec<Value> = user
        .content
        .iter()
        .map(|item| match item {
            UserContent::Text { text } => json!({ "type": "text", "text": text }),
            UserContent::Image { image_url } => json!({
                "type": "image_url",
                "image_url": { "url": image_url },
            }),
        })
        .collect();
    json!({ "role": "user", "content": items })
}
