//! Generation providers.
//!
//! The campaign workflow talks to a language model through the
//! [`GenerationProvider`] trait: a prompt (plus an optional JSON schema for
//! structured output) goes in, raw text comes out. Parsing and contract
//! checks happen in the generators, not here.
//!
//! Providers:
//! - [`OllamaProvider`] - local Ollama daemon (`/api/generate`)
//! - [`OpenAIProvider`] - any OpenAI-compatible chat completions endpoint

#[cfg(feature = "ai")]
mod ollama;
#[cfg(feature = "ai")]
mod openai;

#[cfg(feature = "ai")]
pub use ollama::OllamaProvider;
#[cfg(feature = "ai")]
pub use openai::OpenAIProvider;

use std::sync::Arc;

use async_trait::async_trait;

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Optional system message
    pub system: Option<String>,

    /// User prompt
    pub prompt: String,

    /// JSON schema the output must follow (None for free text)
    pub schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    /// Request free-form text.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self { system: None, prompt: prompt.into(), schema: None }
    }

    /// Request JSON output following `schema`.
    pub fn structured(prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self { system: None, prompt: prompt.into(), schema: Some(schema) }
    }

    /// Attach a system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Whether structured output was requested.
    pub fn is_structured(&self) -> bool {
        self.schema.is_some()
    }
}

/// Trait for generation providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Run one completion and return the raw response text.
    async fn complete(&self, request: &GenerationRequest) -> Result<String, AIError>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Check if the provider is reachable.
    async fn is_available(&self) -> bool;
}

/// Trait for providers that can embed text (used by vector stores).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AIError>;
}

#[async_trait]
impl<P: GenerationProvider + ?Sized> GenerationProvider for Arc<P> {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, AIError> {
        (**self).complete(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }
}

/// AI error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AIError {
    #[error("Provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No response from AI")]
    NoResponse,
}

/// Build the provider named in the configuration.
#[cfg(feature = "ai")]
pub fn provider_from_config(
    config: &crate::core::AiConfig,
) -> anyhow::Result<Arc<dyn GenerationProvider>> {
    let timeout = std::time::Duration::from_secs(config.request_timeout_secs.max(1));

    match config.provider.to_lowercase().as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::from_config(&config.ollama, timeout)?)),
        "openai" => Ok(Arc::new(OpenAIProvider::from_config(&config.openai, timeout)?)),
        other => anyhow::bail!("Unknown AI provider '{}' (expected ollama or openai)", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let text = GenerationRequest::text("write a plan").with_system("You are a planner.");
        assert!(!text.is_structured());
        assert_eq!(text.system.as_deref(), Some("You are a planner."));

        let structured =
            GenerationRequest::structured("write a subject", serde_json::json!({"type": "object"}));
        assert!(structured.is_structured());
    }

    #[test]
    fn test_error_display() {
        let err = AIError::ApiError { status: 503, body: "loading model".to_string() };
        assert_eq!(err.to_string(), "API error (503): loading model");
    }

    #[cfg(feature = "ai")]
    #[test]
    fn test_provider_from_config() {
        let mut config = crate::core::AiConfig::default();
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "ollama");

        config.provider = "OpenAI".to_string();
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");

        config.provider = "mystery".to_string();
        assert!(provider_from_config(&config).is_err());
    }
}
