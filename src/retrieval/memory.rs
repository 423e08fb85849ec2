//! In-memory document store.
//!
//! Loads documents from JSON files and ranks them by how many distinct query
//! terms they contain. Good enough for demos and tests; production runs use a
//! vector store.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;

use super::{Document, DocumentStore, RetrievalError, StoreId};

/// Document store backed by in-memory lists.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<StoreId, Vec<Document>>,
}

impl MemoryStore {
    /// Create an empty store (every search returns no matches).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to a store.
    pub fn insert(&mut self, store: StoreId, document: Document) {
        self.documents.entry(store).or_default().push(document);
    }

    /// Builder-style variant of [`insert`](Self::insert) taking plain text.
    pub fn with_document(mut self, store: StoreId, text: impl Into<String>) -> Self {
        self.insert(store, Document::new(text));
        self
    }

    /// Load `<dir>/product_features.json` and `<dir>/promotions.json`.
    ///
    /// Each file holds a JSON array of documents (`{"text": ...}`) or plain
    /// strings. Missing files leave that store empty.
    pub fn load_dir(dir: &Path) -> Result<Self, RetrievalError> {
        let mut store = Self::new();

        for id in StoreId::ALL {
            let path = dir.join(format!("{}.json", id.as_str()));
            if !path.exists() {
                tracing::warn!(store = %id, path = %path.display(), "Document file missing");
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .map_err(|e| RetrievalError::Load(format!("{}: {}", path.display(), e)))?;
            let entries: Vec<DocumentEntry> = serde_json::from_str(&content)
                .map_err(|e| RetrievalError::Load(format!("{}: {}", path.display(), e)))?;

            for entry in entries {
                store.insert(id, entry.into());
            }
        }

        Ok(store)
    }

    /// Number of documents in a store.
    pub fn len(&self, store: StoreId) -> usize {
        self.documents.get(&store).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn search(
        &self,
        store: StoreId,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        let Some(documents) = self.documents.get(&store) else {
            return Ok(Vec::new());
        };

        let terms = terms(query);
        let mut scored: Vec<(usize, &Document)> = documents
            .iter()
            .map(|doc| {
                let doc_terms = terms_set(&doc.text);
                (terms.iter().filter(|t| doc_terms.contains(*t)).count(), doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_n)
            .map(|(score, doc)| Document { score: Some(score as f32), ..doc.clone() })
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum DocumentEntry {
    Text(String),
    Full(Document),
}

impl From<DocumentEntry> for Document {
    fn from(entry: DocumentEntry) -> Self {
        match entry {
            DocumentEntry::Text(text) => Self::new(text),
            DocumentEntry::Full(doc) => doc,
        }
    }
}

/// Distinct lowercase terms longer than two characters.
fn terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn terms_set(text: &str) -> HashSet<String> {
    terms(text).into_iter().collect()
}
