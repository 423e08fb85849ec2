//! Document retrieval for campaign research.
//!
//! Two logical stores are consulted independently for every product: one
//! holding product feature material and one holding pricing and promotions.
//! Ranking belongs to the store; callers only get an ordered, possibly empty
//! list of matches.

mod memory;

#[cfg(feature = "ai")]
mod chroma;

#[cfg(feature = "ai")]
pub use chroma::ChromaStore;
pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Logical document stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreId {
    /// Product feature and marketing material
    ProductFeatures,
    /// Pricing, deals, and promotions
    Promotions,
}

impl StoreId {
    /// All stores, in query order.
    pub const ALL: [Self; 2] = [Self::ProductFeatures, Self::Promotions];

    /// Stable identifier (also the memory backend's file stem).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductFeatures => "product_features",
            Self::Promotions => "promotions",
        }
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Document text
    pub text: String,

    /// Relevance reported by the store (higher is better), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    /// Create a document from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), score: None }
    }
}

/// Retrieval errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    #[error("Store '{store}' is unreachable: {reason}")]
    Unreachable { store: StoreId, reason: String },

    #[error("Malformed response from store '{store}': {reason}")]
    MalformedResponse { store: StoreId, reason: String },

    #[error("Failed to load documents: {0}")]
    Load(String),
}

/// Trait for document stores.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return up to `top_n` documents matching `query`, best first.
    async fn search(
        &self,
        store: StoreId,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError>;

    /// Get the backend name.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn search(
        &self,
        store: StoreId,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        (**self).search(store, query, top_n).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build the document store named in the configuration.
pub fn store_from_config(config: &crate::core::Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.retrieval.backend.to_lowercase().as_str() {
        "memory" => {
            let store = match config.retrieval.documents_dir {
                Some(ref dir) => {
                    let store = MemoryStore::load_dir(dir)?;
                    if StoreId::ALL.iter().all(|id| store.len(*id) == 0) {
                        tracing::warn!(
                            dir = %dir.display(),
                            "No documents found, research will run without context"
                        );
                    }
                    store
                }
                None => {
                    tracing::warn!("No documents_dir configured, research will run without context");
                    MemoryStore::new()
                }
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "ai")]
        "chroma" => {
            let embedder = crate::ai::OllamaProvider::from_config(
                &config.ai.ollama,
                std::time::Duration::from_secs(config.ai.request_timeout_secs.max(1)),
            )?;
            Ok(Arc::new(ChromaStore::from_config(&config.retrieval.chroma, Arc::new(embedder))?))
        }
        other => anyhow::bail!("Unknown retrieval backend '{}'", other),
    }
}
