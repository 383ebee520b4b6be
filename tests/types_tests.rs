//! Tests for core type serialization and conversions.

use std::str::FromStr;

use pretty_assertions::assert_eq;
use serde_json::json;

use agentry::types::{
    AgentEvent, AgentEventType, FinishReason, Message, StreamFragment, Usage,
};

#[test]
fn events_serialize_with_snake_case_type_tags() {
    let event = AgentEvent::ContentDelta {
        delta: "hi".to_string(),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "content_delta");
    assert_eq!(value["delta"], "hi");

    let event = AgentEvent::ToolCallOutput {
        call_id: "c1".to_string(),
        name: "get_weather".to_string(),
        content: "Sunny".to_string(),
        execution_time_ms: None,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "tool_call_output");
    // Absent timing is omitted entirely.
    assert!(value.get("execution_time_ms").is_none());
}

#[test]
fn event_type_names_round_trip() {
    for event_type in [
        AgentEventType::RawFragment,
        AgentEventType::Usage,
        AgentEventType::ContentDelta,
        AgentEventType::ToolCallDelta,
        AgentEventType::ToolCall,
        AgentEventType::AssistantMessage,
        AgentEventType::ToolCallOutput,
    ] {
        let name = event_type.to_string();
        assert_eq!(AgentEventType::from_str(&name).unwrap(), event_type);
    }
    assert_eq!(
        AgentEventType::from_str("content_delta").unwrap(),
        AgentEventType::ContentDelta,
    );
}

#[test]
fn default_includes_exclude_raw_passthrough() {
    let includes = AgentEventType::default_includes();
    assert!(!includes.contains(&AgentEventType::RawFragment));
    assert!(includes.contains(&AgentEventType::ContentDelta));
}

#[test]
fn messages_serialize_with_role_tags() {
    let value = serde_json::to_value(Message::user("hello")).unwrap();
    assert_eq!(value["role"], "user");
    assert_eq!(value["content"][0]["type"], "text");

    let value = serde_json::to_value(Message::system("be brief")).unwrap();
    assert_eq!(value["role"], "system");
    assert_eq!(value["content"], "be brief");
}

#[test]
fn fragments_deserialize_from_minimal_wire_chunks() {
    let fragment: StreamFragment = serde_json::from_value(json!({
        "id": "chatcmpl-1",
        "choices": [
            {"index": 0, "delta": {"content": "hi"}, "finish_reason": null}
        ],
    }))
    .unwrap();
    assert_eq!(fragment.choices[0].delta.content.as_deref(), Some("hi"));
    assert_eq!(fragment.choices[0].finish_reason, None);

    let fragment: StreamFragment = serde_json::from_value(json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}],
    }))
    .unwrap();
    assert_eq!(
        fragment.choices[0].finish_reason,
        Some(FinishReason::ToolCalls),
    );
}

#[test]
fn usage_merge_accumulates_totals() {
    let mut total = Usage::new(10, 5);
    total.merge(&Usage::new(3, 2));
    assert_eq!(total.input_tokens, 13);
    assert_eq!(total.output_tokens, 7);
    assert_eq!(total.total_tokens, 20);
}
