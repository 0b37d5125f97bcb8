//! OpenAI-compatible chat-completion client.
//!
//! Every mini-app talks to the model through [`ChatBackend`] so the
//! generators can run against a scripted backend in tests and against
//! [`UnconfiguredBackend`] when no API key is set.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use eduhub_types::api::ChatTurn;

use crate::error::{AiError, AiResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatTurn>,
    /// Ask the endpoint for a JSON object instead of free text.
    pub json_mode: bool,
    pub temperature: Option<f32>,
}

pub trait ChatBackend: Send + Sync {
    /// Returns the text of the first choice.
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, AiResult<String>>;
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

// OpenAI-compatible wire types
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            client,
        }
    }

    async fn send(&self, request: CompletionRequest) -> AiResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(
            "Chat completion: {} messages, json_mode={}",
            request.messages.len(),
            request.json_mode
        );

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let parsed: ChatResponse = res.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

impl ChatBackend for OpenAiClient {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, AiResult<String>> {
        Box::pin(self.send(request))
    }
}

/// Used when no API key is configured: every call fails, so every mini-app
/// serves its offline content.
pub struct UnconfiguredBackend;

impl ChatBackend for UnconfiguredBackend {
    fn complete(&self, _request: CompletionRequest) -> BoxFuture<'_, AiResult<String>> {
        Box::pin(async { Err(AiError::NotConfigured) })
    }
}

/// Pick the backend for a configuration.
pub fn backend_from_config(config: &AiConfig) -> Arc<dyn ChatBackend> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            Arc::new(OpenAiClient::new(&config.base_url, key, &config.model))
        }
        _ => Arc::new(UnconfiguredBackend),
    }
}
