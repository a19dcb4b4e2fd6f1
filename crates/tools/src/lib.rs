//! Built-in tool implementations for thinkloop.
//!
//! Tools give the agent the ability to act: do math, and answer questions
//! from a vector store. Anything else can be plugged in as a closure with
//! [`FnTool`].

pub mod calculator;
pub mod fn_tool;
pub mod knowledge_search;
pub mod vector_index;

use std::sync::Arc;
use thinkloop_config::RetrievalConfig;
use thinkloop_core::error::ToolError;
use thinkloop_core::search::{Embedder, SimilaritySearch};
use thinkloop_core::tool::ToolRegistry;

pub use calculator::CalculatorTool;
pub use fn_tool::FnTool;
pub use knowledge_search::KnowledgeSearchTool;
pub use vector_index::{InMemoryIndex, cosine_similarity};

/// Create a registry with the built-in tools that need no collaborators.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CalculatorTool))?;
    Ok(registry)
}

/// Create the default registry plus a `knowledge_search` tool over `store`.
pub fn registry_with_knowledge(
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn SimilaritySearch>,
    top_k: usize,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = default_registry()?;
    registry.register(Arc::new(KnowledgeSearchTool::new(embedder, store, top_k)))?;
    Ok(registry)
}

/// Create the default registry plus a `knowledge_search` tool configured by
/// the `[retrieval]` section.
pub fn registry_from_config(
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn SimilaritySearch>,
    config: &RetrievalConfig,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = default_registry()?;
    registry.register(Arc::new(KnowledgeSearchTool::from_config(
        embedder, store, config,
    )))?;
    Ok(registry)
}
