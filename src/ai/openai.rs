//! OpenAI-compatible chat completions integration.
//!
//! Works against the OpenAI API and against local servers that expose the
//! same surface (Ollama's `/v1`, llama.cpp, vLLM).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AIError, GenerationProvider, GenerationRequest};
use crate::core::OpenAIConfig;

/// OpenAI-compatible API provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Create from configuration with a request timeout.
    ///
    /// The API key is read from the environment variable named in the
    /// configuration; local endpoints work without one.
    pub fn from_config(config: &OpenAIConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Create with a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage { role: "system".to_string(), content: system.clone() });
        }
        messages.push(ChatMessage { role: "user".to_string(), content: request.prompt.clone() });

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.7),
            response_format: request
                .is_structured()
                .then(|| ResponseFormat { kind: "json_object".to_string() }),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAIProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, AIError> {
        let body = self.build_request(request);
        tracing::debug!(model = %self.model, structured = request.is_structured(), "Chat completion");

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .json(&body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| AIError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AIError::ApiError { status, body });
        }

        let response: ChatResponse =
            response.json().await.map_err(|e| AIError::InvalidResponse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AIError::NoResponse)
    }

    fn name(&self) -> &str {
        "openai"
    }

    async fn is_available(&self) -> bool {
        let mut builder = self
            .client
            .get(format!("{}/models", self.base_url.trim_end_matches('/')))
            .timeout(Duration::from_secs(2));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        builder.send().await.map(|r| r.status().is_success()).unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
