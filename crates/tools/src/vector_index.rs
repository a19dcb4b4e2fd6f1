//! In-memory vector index.
//!
//! Stores documents with their embeddings and answers similarity queries by
//! brute-force cosine similarity. Suitable for tests, demos and small
//! corpora; production deployments put a vector database behind
//! [`SimilaritySearch`] instead.

use async_trait::async_trait;
use thinkloop_core::error::SearchError;
use thinkloop_core::search::{SearchHit, SimilaritySearch};
use tokio::sync::RwLock;
use tracing::debug;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]. Returns 0.0 for empty, zero-norm or
/// length-mismatched inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    (dot / denom) as f32
}

struct IndexedDocument {
    content: String,
    metadata: serde_json::Map<String, serde_json::Value>,
    embedding: Vec<f32>,
}

/// A brute-force cosine-similarity index.
pub struct InMemoryIndex {
    dimension: Option<usize>,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            dimension: None,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// An index that rejects embeddings of any other dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Add a document with a precomputed embedding.
    pub async fn insert(
        &self,
        content: impl Into<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
        embedding: Vec<f32>,
    ) -> Result<(), SearchError> {
        self.check_dimension(&embedding)?;
        self.documents.write().await.push(IndexedDocument {
            content: content.into(),
            metadata,
            embedding,
        });
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), SearchError> {
        match self.dimension {
            Some(expected) if expected != embedding.len() => Err(SearchError::QueryFailed(
                format!("expected {expected}-dimensional embedding, got {}", embedding.len()),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimilaritySearch for InMemoryIndex {
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.check_dimension(query_embedding)?;
        let documents = self.documents.read().await;

        let mut hits: Vec<SearchHit> = documents
            .iter()
            .map(|doc| SearchHit {
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                score: cosine_similarity(&doc.embedding, query_embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        debug!(candidates = documents.len(), returned = hits.len(), "In-memory similarity search");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_known_values() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]) - 0.7071).abs() < 0.001);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn search_ranks_by_descending_similarity() {
        let index = InMemoryIndex::new();
        let meta = serde_json::Map::new();
        index.insert("orthogonal", meta.clone(), vec![0.0, 1.0, 0.0]).await.unwrap();
        index.insert("identical", meta.clone(), vec![1.0, 0.0, 0.0]).await.unwrap();
        index.insert("partial", meta, vec![0.5, 0.5, 0.0]).await.unwrap();

        let hits = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        let contents: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        assert_eq!(contents, vec!["identical", "partial"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn search_keeps_metadata() {
        let index = InMemoryIndex::new();
        let mut meta = serde_json::Map::new();
        meta.insert("source".into(), serde_json::json!("faq.md"));
        index.insert("answer", meta, vec![1.0, 0.0]).await.unwrap();

        let hits = index.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["source"], "faq.md");
    }

    #[tokio::test]
    async fn dimension_is_enforced() {
        let index = InMemoryIndex::with_dimension(3);
        assert!(index.insert("bad", serde_json::Map::new(), vec![1.0]).await.is_err());
        assert!(index.search(&[1.0, 0.0], 1).await.is_err());
        assert!(index.is_empty().await);
    }
}
