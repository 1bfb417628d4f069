use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, messages_to_openai_spec, openai_response_to_message,
    tools_to_openai_spec,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

// Local models can take minutes on a long tool transcript
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i32>,
}

#[derive(Deserialize)]
struct CompletionUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl From<CompletionUsage> for Usage {
    fn from(usage: CompletionUsage) -> Self {
        Usage::new(
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens,
        )
    }
}

/// Client for OpenAI-compatible chat completions, used for OpenAI and Ollama
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        )
    }

    /// Usage block of a response; servers that omit it yield empty usage
    fn usage_of(response: &Value) -> Usage {
        response
            .get("usage")
            .cloned()
            .and_then(|usage| serde_json::from_value::<CompletionUsage>(usage).ok())
            .map(Usage::from)
            .unwrap_or_default()
    }

    async fn post(&self, payload: &CompletionRequest<'_>) -> Result<Value> {
        let mut request = self.client.post(self.endpoint()).json(payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(response.json().await?);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(anyhow!("Server error: {}", status));
        }

        // Error bodies carry the reason, e.g. context length
        let body: Value = response.json().await.unwrap_or(Value::Null);
        match body.get("error").and_then(check_openai_context_length_error) {
            Some(err) => Err(err.into()),
            None => Err(anyhow!("Request failed: {}\nResponse: {}", status, body)),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage)> {
        // Empty once the instruction has left the conversation window
        let mut wire_messages = Vec::new();
        if !system.is_empty() {
            wire_messages.push(json!({"role": "system", "content": system}));
        }
        wire_messages.extend(messages_to_openai_spec(messages));

        let payload = CompletionRequest {
            model: &self.config.model,
            messages: wire_messages,
            tools: tools_to_openai_spec(tools)?,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, messages = messages.len(), tools = tools.len(), "requesting completion");
        let response = self.post(&payload).await?;

        if let Some(error) = response.get("error") {
            return Err(match check_openai_context_length_error(error) {
                Some(err) => err.into(),
                None => anyhow!("Orchestrator returned an error: {}", error),
            });
        }

        let usage = Self::usage_of(&response);
        let message = openai_response_to_message(response)?;
        Ok((message, usage))
    }
}
