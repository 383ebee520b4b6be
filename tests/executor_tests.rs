//! Tests for sequential tool-call execution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use agentry::error::AgentryError;
use agentry::tools::{
    execute_tool_calls, FunctionTool, ToolParameters, ToolRegistry,
};
use agentry::types::{AgentEvent, ToolCallItem};

fn call(call_id: &str, name: &str, arguments: &str) -> ToolCallItem {
    ToolCallItem {
        call_id: call_id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn weather_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FunctionTool::new(
        "get_weather",
        "Get the weather for a city",
        ToolParameters::object().string("city", "City name", true).build(),
        |args, _ctx| async move {
            args.get_str("city")?;
            Ok(serde_json::Value::String("Sunny, 20C".to_string()))
        },
    )));
    registry
}

#[tokio::test]
async fn executed_call_produces_a_tool_call_and_output_pair() {
    let registry = weather_registry();
    let calls = vec![call("c1", "get_weather", r#"{"city":"Paris"}"#)];

    let events = execute_tool_calls(&registry, &calls).await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        AgentEvent::ToolCall {
            call_id,
            name,
            arguments,
        } => {
            assert_eq!(call_id, "c1");
            assert_eq!(name, "get_weather");
            assert_eq!(arguments, r#"{"city":"Paris"}"#);
        }
        other => panic!("expected tool call event, got {other:?}"),
    }
    match &events[1] {
        AgentEvent::ToolCallOutput {
            call_id,
            content,
            execution_time_ms,
            ..
        } => {
            assert_eq!(call_id, "c1");
            assert_eq!(content, "Sunny, 20C");
            assert!(execution_time_ms.is_some());
        }
        other => panic!("expected tool output event, got {other:?}"),
    }
}

#[tokio::test]
async fn a_failing_tool_does_not_stop_the_batch() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FunctionTool::new(
        "explode",
        "Always fails",
        ToolParameters::empty(),
        |_args, _ctx| async move {
            Err::<serde_json::Value, _>(AgentryError::tool("explode", "boom"))
        },
    )));
    let counter = Arc::new(AtomicUsize::new(0));
    let tracked = counter.clone();
    registry.register(Arc::new(FunctionTool::new(
        "count",
        "Counts invocations",
        ToolParameters::empty(),
        move |_args, _ctx| {
            let tracked = tracked.clone();
            async move {
                tracked.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!("counted"))
            }
        },
    )));

    let calls = vec![call("c1", "explode", "{}"), call("c2", "count", "{}")];
    let events = execute_tool_calls(&registry, &calls).await;

    // Both calls ran; the failure surfaced as output content.
    assert_eq!(events.len(), 4);
    match &events[1] {
        AgentEvent::ToolCallOutput { content, .. } => assert!(content.contains("boom")),
        other => panic!("expected tool output event, got {other:?}"),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_tool_is_skipped_with_no_events() {
    let registry = weather_registry();
    let calls = vec![
        call("c1", "no_such_tool", "{}"),
        call("c2", "get_weather", r#"{"city":"Paris"}"#),
    ];

    let events = execute_tool_calls(&registry, &calls).await;

    // No pair at all for the unknown name, the rest of the batch runs.
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| match e {
        AgentEvent::ToolCall { name, .. } | AgentEvent::ToolCallOutput { name, .. } =>
            name == "get_weather",
        _ => false,
    }));
}

#[tokio::test]
async fn malformed_arguments_become_an_error_output() {
    let registry = weather_registry();
    let calls = vec![call("c1", "get_weather", r#"{"city":"#)];

    let events = execute_tool_calls(&registry, &calls).await;

    assert_eq!(events.len(), 2);
    match &events[1] {
        AgentEvent::ToolCallOutput { content, .. } => {
            assert!(content.contains("invalid arguments"));
        }
        other => panic!("expected tool output event, got {other:?}"),
    }
}

#[tokio::test]
async fn non_string_results_are_json_serialized() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FunctionTool::new(
        "lookup",
        "Returns structured data",
        ToolParameters::empty(),
        |_args, _ctx| async move { Ok(serde_json::json!({"temp": 20, "sky": "clear"})) },
    )));

    let events = execute_tool_calls(&registry, &[call("c1", "lookup", "{}")]).await;
    match &events[1] {
        AgentEvent::ToolCallOutput { content, .. } => {
            let parsed: serde_json::Value = serde_json::from_str(content).unwrap();
            assert_eq!(parsed["temp"], 20);
        }
        other => panic!("expected tool output event, got {other:?}"),
    }
}
