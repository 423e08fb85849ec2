//! Core plumbing shared by the workflow and the CLI.
//!
//! Configuration loading, the fixed retry policy, and cooperative
//! cancellation.

mod cancel;
mod config;
mod retry;

pub use cancel::CancelFlag;
pub use config::{
    AiConfig, CampaignConfig, CatalogCategory, ChromaConfig, Config, OllamaConfig, OpenAIConfig,
    RetrievalConfig, RetryConfig, DEFAULT_TONES,
};
pub use retry::{retry_async, RetryPolicy, RetryResult, Retryable};
