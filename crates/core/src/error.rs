//! Error types for the thinkloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error enum; `Error` is what `AgentLoop::run`
//! hands back to its caller.

use thiserror::Error;

use crate::agent::AgentStep;

/// The top-level error type for all thinkloop operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model errors (not recoverable inside the loop) ---
    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Similarity search errors ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Trace persistence errors ---
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    // --- Loop termination ---
    /// The loop ran `max_iterations` times without reaching a final answer.
    /// `steps` is the scratchpad at the moment of abort.
    #[error("Iteration limit of {max_iterations} exceeded after {} tool steps", .steps.len())]
    IterationLimitExceeded {
        max_iterations: u32,
        steps: Vec<AgentStep>,
    },

    #[error("Run cancelled after {} tool steps", .steps.len())]
    Cancelled { steps: Vec<AgentStep> },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected by model backend: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Trace I/O failed for query {query_id}: {source}")]
    Io {
        query_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Trace serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
