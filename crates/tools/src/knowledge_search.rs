//! Knowledge search tool — answers questions from a vector store.
//!
//! Embeds the tool input, asks the similarity-search backend for the closest
//! `top_k` documents, and returns their contents as plain text, most similar
//! first.

use async_trait::async_trait;
use std::sync::Arc;
use thinkloop_config::RetrievalConfig;
use thinkloop_core::error::ToolError;
use thinkloop_core::search::{Embedder, SimilaritySearch};
use thinkloop_core::tool::Tool;
use tracing::debug;

const NO_RESULTS: &str = "No relevant documents found.";

pub struct KnowledgeSearchTool {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn SimilaritySearch>,
    top_k: usize,
    description: String,
}

impl KnowledgeSearchTool {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn SimilaritySearch>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k: top_k.max(1),
            description: "Useful for answering questions about the documents in the knowledge base. The input should be a complete question.".into(),
        }
    }

    /// Build the tool from the `[retrieval]` config section: `top_k` bounds the
    /// hits and `collection` is named in the description.
    pub fn from_config(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn SimilaritySearch>,
        config: &RetrievalConfig,
    ) -> Self {
        Self::new(embedder, store, config.top_k).with_description(format!(
            "Useful for answering questions about the documents in the '{}' collection. The input should be a complete question.",
            config.collection
        ))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Replace the description shown to the model (e.g. to name the collection).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "knowledge_search"
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("query must not be empty".into()));
        }

        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let hits = self
            .store
            .search(&embedding, self.top_k)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        debug!(query, hits = hits.len(), "Knowledge search");

        if hits.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        Ok(hits
            .iter()
            .map(|hit| hit.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::InMemoryIndex;
    use thinkloop_core::error::SearchError;

    /// Embeds text as counts of a few keywords.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
            let lower = text.to_lowercase();
            Ok(["rust", "python", "coffee"]
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
            Err(SearchError::EmbeddingFailed("quota exhausted".into()))
        }
    }

    async fn seeded_index() -> Arc<InMemoryIndex> {
        let index = Arc::new(InMemoryIndex::new());
        let meta = serde_json::Map::new();
        for doc in [
            "Rust guarantees memory safety without a garbage collector.",
            "Python is dynamically typed.",
            "Coffee is brewed from roasted beans.",
        ] {
            let embedding = KeywordEmbedder.embed(doc).await.unwrap();
            index.insert(doc, meta.clone(), embedding).await.unwrap();
        }
        index
    }

    #[tokio::test]
    async fn returns_most_similar_documents_first() {
        let tool = KnowledgeSearchTool::new(Arc::new(KeywordEmbedder), seeded_index().await, 1);
        let output = tool.invoke("Tell me about Rust").await.unwrap();
        assert_eq!(output, "Rust guarantees memory safety without a garbage collector.");
    }

    #[tokio::test]
    async fn config_top_k_limits_hits() {
        let config: thinkloop_config::AppConfig =
            toml::from_str("[retrieval]\ncollection = \"handbook\"\ntop_k = 1\n").unwrap();
        let tool = KnowledgeSearchTool::from_config(
            Arc::new(KeywordEmbedder),
            seeded_index().await,
            &config.retrieval,
        );
        assert_eq!(tool.top_k(), 1);
        assert!(tool.description().contains("'handbook' collection"));

        // Matches two documents, only the closer one is returned.
        let output = tool.invoke("rust or python? mostly rust").await.unwrap();
        assert_eq!(output, "Rust guarantees memory safety without a garbage collector.");

        let wide = KnowledgeSearchTool::from_config(
            Arc::new(KeywordEmbedder),
            seeded_index().await,
            &RetrievalConfig {
                top_k: 2,
                ..RetrievalConfig::default()
            },
        );
        let output = wide.invoke("rust or python? mostly rust").await.unwrap();
        assert_eq!(output.split("\n\n").count(), 2);
    }

    #[tokio::test]
    async fn empty_store_reports_no_results() {
        let tool = KnowledgeSearchTool::new(
            Arc::new(KeywordEmbedder),
            Arc::new(InMemoryIndex::new()),
            3,
        );
        assert_eq!(tool.invoke("rust?").await.unwrap(), NO_RESULTS);
    }

    #[tokio::test]
    async fn embedding_failure_is_execution_failure() {
        let tool = KnowledgeSearchTool::new(Arc::new(FailingEmbedder), seeded_index().await, 3);
        let err = tool.invoke("rust").await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "knowledge_search");
                assert!(reason.contains("quota exhausted"));
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_query_rejected() {
        let tool = KnowledgeSearchTool::new(Arc::new(KeywordEmbedder), seeded_index().await, 3);
        assert!(matches!(
            tool.invoke("   ").await,
            Err(ToolError::InvalidInput(_))
        ));
    }
}
