//! OpenAI-style Chat Completions streaming client.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::config::AgentryConfig;
use crate::error::{AgentryError, Result};
use crate::types::StreamFragment;

use super::http::{bearer_headers, parse_sse_data, shared_client, status_to_error};
use super::{CompletionClient, CompletionRequest, FragmentStream};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Streaming client for any `/chat/completions`-compatible endpoint.
pub struct OpenAiChatClient {
    api_key: String,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build a client from config (`openai` provider entry).
    pub fn from_config(config: &AgentryConfig) -> Result<Self> {
        let api_key = config.get_api_key("openai").ok_or_else(|| {
            AgentryError::Configuration("no API key configured for openai".to_string())
        })?;
        Ok(Self::new(api_key, config.get_base_url("openai")))
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
            "stream_options": { "include_usage": true },
        });

        let obj = body.as_object_mut().unwrap();
        if !request.tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());
            obj.insert("tool_choice".into(), "auto".into());
        }

        body
    }
}

#[async_trait]
impl CompletionClient for OpenAiChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<FragmentStream> {
        let body = self.build_request_body(&request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "starting streamed completion");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = String::new();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AgentryError::Network(e));
                        break;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    if let Some(data) = parse_sse_data(&line) {
                        match serde_json::from_str::<StreamFragment>(data) {
                            Ok(fragment) => yield Ok(fragment),
                            Err(e) => {
                                debug!(error = %e, "skipping unparseable stream chunk");
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
