//! Ollama local LLM integration.
//!
//! Implements [`GenerationProvider`] and [`EmbeddingProvider`] for a local
//! Ollama daemon.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AIError, EmbeddingProvider, GenerationProvider, GenerationRequest};
use crate::core::OllamaConfig;

/// Ollama API provider for local LLM.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// Uses localhost:11434 by default.
    pub fn new() -> Self {
        let defaults = OllamaConfig::default();
        Self {
            client: Client::new(),
            base_url: std::env::var("OLLAMA_HOST").unwrap_or(defaults.base_url),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            embedding_model: defaults.embedding_model,
        }
    }

    /// Create from configuration with a request timeout.
    ///
    /// `OLLAMA_HOST` and `OLLAMA_MODEL` still take precedence.
    pub fn from_config(config: &OllamaConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: std::env::var("OLLAMA_HOST").unwrap_or_else(|_| config.base_url.clone()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| config.model.clone()),
            embedding_model: config.embedding_model.clone(),
        })
    }

    /// Create with a specific base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Create with a specific embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    fn build_request(&self, request: &GenerationRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            format: request.schema.clone(),
            stream: false,
        }
    }

    async fn post<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AIError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url.trim_end_matches('/'), path))
            .json(body)
            .send()
            .await
            .map_err(|e| AIError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AIError::ApiError { status, body });
        }

        response.json().await.map_err(|e| AIError::InvalidResponse(e.to_string()))
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, AIError> {
        let body = self.build_request(request);
        tracing::debug!(model = %self.model, structured = request.is_structured(), "Ollama generate");

        let response: OllamaResponse = self.post("/api/generate", &body).await?;
        if response.response.trim().is_empty() {
            return Err(AIError::NoResponse);
        }
        Ok(response.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/api/tags", self.base_url.trim_end_matches('/')))
            .timeout(Duration::from_secs(2))
            .send()
            .await;

        result.map(|r| r.status().is_success()).unwrap_or(false)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AIError> {
        let body = EmbeddingRequest { model: self.embedding_model.clone(), prompt: text.to_string() };
        let response: EmbeddingResponse = self.post("/api/embeddings", &body).await?;

        if response.embedding.is_empty() {
            return Err(AIError::InvalidResponse("empty embedding".to_string()));
        }
        Ok(response.embedding)
    }
}

/// Ollama generate request structure.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// JSON schema for structured output
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    stream: bool,
}

/// Ollama generate response structure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}
