//! # thinkloop Core
//!
//! Domain types, traits, and error definitions for the thinkloop ReAct agent.
//! This crate has **no I/O of its own**. It defines the domain model that the
//! agent loop and the tools implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, tool, similarity search) is a
//! trait here. Implementations live elsewhere. This enables:
//! - Plugging in any model backend or vector store
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod message;
pub mod model;
pub mod search;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentStep, Decision, FinalAnswer, ToolInvocation};
pub use error::{Error, ModelError, Result, SearchError, ToolError, TraceError};
pub use message::{ConversationMessage, Role};
pub use model::{CompletionRequest, LanguageModel, OBSERVATION_STOP, collect_stream};
pub use search::{Embedder, SearchHit, SimilaritySearch};
pub use tool::{Tool, ToolRegistry};
