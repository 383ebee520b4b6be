//! Tests for agent configuration and the completion adapter.

mod common;

use std::sync::Arc;

use futures::StreamExt;
use pretty_assertions::assert_eq;

use agentry::agent::{Agent, CompletionPolicy};
use agentry::history::History;
use agentry::transcript::TranscriptWriter;
use agentry::types::Message;

use common::{text_turn, ScriptedClient};

fn scripted(name: &str, turns: Vec<Vec<agentry::types::StreamFragment>>) -> (Agent, Arc<ScriptedClient>) {
    let client = Arc::new(ScriptedClient::new(turns));
    let agent = Agent::new(name, "test-model", "Test instructions.", client.clone());
    (agent, client)
}

#[test]
fn default_policy_is_stop_on_finish() {
    let (agent, _client) = scripted("A", vec![]);
    assert_eq!(agent.completion_policy(), CompletionPolicy::StopOnFinish);
    assert!(!agent.registry().has("task_done"));
    assert!(!agent.registry().has("wait_for_user"));
}

#[test]
fn call_policy_registers_sentinel_tools_and_instructions() {
    let (agent, _client) = scripted("A", vec![]);
    let agent = agent.with_completion_policy(CompletionPolicy::StopOnToolCall);

    assert!(agent.registry().has("task_done"));
    assert!(agent.registry().has("wait_for_user"));

    let prompt = agent.system_prompt();
    assert!(prompt.starts_with("You are A. Test instructions."));
    assert!(prompt.contains("task_done"));
    assert!(prompt.contains("wait_for_user"));
}

#[test]
fn stop_policy_prompt_omits_sentinel_instructions() {
    let (agent, _client) = scripted("A", vec![]);
    assert!(!agent.system_prompt().contains("task_done"));
}

#[tokio::test]
async fn completion_prepends_the_system_message() {
    let (agent, client) = scripted("Helper", vec![text_turn("t1", "ok")]);
    let mut history = History::new();
    history.push(Message::user("hello"));

    let mut stream = agent.completion(&history, None).await.unwrap();
    while let Some(event) = stream.next().await {
        event.unwrap();
    }

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 2);
    assert_eq!(requests[0].messages[0]["role"], "system");
    assert_eq!(requests[0].messages[1]["role"], "user");
    assert_eq!(requests[0].model, "test-model");
}

#[tokio::test]
async fn completion_records_raw_fragments_to_the_transcript() {
    let (agent, _client) = scripted("Helper", vec![text_turn("t1", "hello there")]);
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("turn.jsonl");
    let sink = Arc::new(TranscriptWriter::create(&path).await.unwrap());

    let history = History::new();
    let mut stream = agent.completion(&history, Some(sink)).await.unwrap();
    while let Some(event) = stream.next().await {
        event.unwrap();
    }

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    // One line per fragment: the start fragment and the finish fragment.
    assert_eq!(contents.lines().count(), 2);
    for line in contents.lines() {
        let fragment: agentry::types::StreamFragment = serde_json::from_str(line).unwrap();
        assert_eq!(fragment.id, "t1");
    }
}
