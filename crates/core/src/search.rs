//! Similarity search collaborators.
//!
//! Retrieval tools turn their text input into an embedding with an
//! [`Embedder`] and then ask a [`SimilaritySearch`] backend (a vector
//! database collection, or the in-memory index in `thinkloop-tools`) for the
//! closest documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The stored document text
    pub content: String,

    /// Arbitrary document metadata (source, chunk index, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Similarity to the query (higher is closer)
    #[serde(default)]
    pub score: f32,
}

/// Computes embeddings for text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError>;
}

/// A vector store that can be queried by embedding.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Return at most `k` hits, ordered by descending similarity.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchHit>, SearchError>;
}
