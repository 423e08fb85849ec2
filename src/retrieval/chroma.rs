//! Chroma vector store over its HTTP API.
//!
//! Queries are embedded locally (Ollama) and sent as `query_embeddings`, so
//! the collections must have been populated with the same embedding model.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{Document, DocumentStore, RetrievalError, StoreId};
use crate::ai::EmbeddingProvider;
use crate::core::ChromaConfig;

/// Chroma-backed document store.
pub struct ChromaStore {
    client: Client,
    base_url: String,
    collections: HashMap<StoreId, String>,
    embedder: Arc<dyn EmbeddingProvider>,
    /// Collection name -> id, resolved lazily
    ids: Mutex<HashMap<String, String>>,
}

impl ChromaStore {
    /// Create from configuration.
    pub fn from_config(
        config: &ChromaConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(std::time::Duration::from_secs(30)).build()?;

        let mut collections = HashMap::new();
        collections.insert(StoreId::ProductFeatures, config.product_collection.clone());
        collections.insert(StoreId::Promotions, config.promotions_collection.clone());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collections,
            embedder,
            ids: Mutex::new(HashMap::new()),
        })
    }

    /// Collection name configured for a store.
    pub fn collection(&self, store: StoreId) -> Option<&str> {
        self.collections.get(&store).map(String::as_str)
    }

    async fn collection_id(&self, store: StoreId, name: &str) -> Result<String, RetrievalError> {
        let mut ids = self.ids.lock().await;
        if let Some(id) = ids.get(name) {
            return Ok(id.clone());
        }

        let url = format!("{}/api/v1/collections/{}", self.base_url, urlencoding::encode(name));
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RetrievalError::Unreachable { store, reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(RetrievalError::Unreachable {
                store,
                reason: format!("collection '{}' lookup returned {}", name, response.status()),
            });
        }

        let collection: CollectionResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse { store, reason: e.to_string() })?;

        ids.insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }
}

#[async_trait]
impl DocumentStore for ChromaStore {
    async fn search(
        &self,
        store: StoreId,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        let name = self.collection(store).ok_or_else(|| RetrievalError::Unreachable {
            store,
            reason: "no collection configured".to_string(),
        })?;
        let id = self.collection_id(store, name).await?;

        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RetrievalError::Unreachable { store, reason: e.to_string() })?;

        let body = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: top_n,
            include: vec!["documents", "distances"],
        };

        tracing::debug!(store = %store, collection = name, top_n, "Chroma query");

        let response = self
            .client
            .post(format!("{}/api/v1/collections/{}/query", self.base_url, id))
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unreachable { store, reason: e.to_string() })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unreachable {
                store,
                reason: format!("query returned {}: {}", status, text),
            });
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse { store, reason: e.to_string() })?;

        Ok(result.into_documents(top_n))
    }

    fn name(&self) -> &str {
        "chroma"
    }
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

/// Chroma returns one inner list per query embedding.
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

impl QueryResponse {
    fn into_documents(self, top_n: usize) -> Vec<Document> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let documents =
            self.documents.and_then(|d| d.into_iter().next()).unwrap_or_default();
        let distances =
            self.distances.and_then(|d| d.into_iter().next()).unwrap_or_default();

        documents
            .into_iter()
            .enumerate()
            .filter_map(|(i, text)| {
                let text = text?;
                Some(Document {
                    id: ids.get(i).cloned(),
                    text,
                    // Smaller distance is better; flip so higher score is better
                    score: distances.get(i).map(|d| -d),
                })
            })
            .take(top_n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AIError;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, AIError> {
            Ok(vec![0.1, 0.2])
        }
    }

    #[test]
    fn test_collections_from_config() {
        let store = ChromaStore::from_config(&ChromaConfig::default(), Arc::new(FixedEmbedder))
            .unwrap();
        assert_eq!(store.name(), "chroma");
        assert_eq!(store.collection(StoreId::ProductFeatures), Some("product_research"));
        assert_eq!(store.collection(StoreId::Promotions), Some("product_offers"));
    }

    #[test]
    fn test_query_response_parsing() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "ids": [["a", "b", "c"]],
            "documents": [["first", null, "third"]],
            "distances": [[0.1, 0.2, 0.3]]
        }))
        .unwrap();

        let docs = response.into_documents(2);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "first");
        assert_eq!(docs[1].id.as_deref(), Some("c"));
        assert!(docs[0].score.unwrap() > docs[1].score.unwrap());
    }

    #[test]
    fn test_query_response_empty() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(response.into_documents(2).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let config =
            ChromaConfig { base_url: "http://127.0.0.1:1".to_string(), ..ChromaConfig::default() };
        let store = ChromaStore::from_config(&config, Arc::new(FixedEmbedder)).unwrap();

        let err = store.search(StoreId::Promotions, "deals", 2).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Unreachable { store: StoreId::Promotions, .. }));
    }
}
