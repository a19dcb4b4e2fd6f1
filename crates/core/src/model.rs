//! LanguageModel trait — the abstraction over completion backends.
//!
//! A model takes a fully rendered prompt and returns raw text, either in one
//! piece or as a stream of text chunks. The agent loop only ever parses the
//! reassembled string.
//!
//! Concrete backends live outside this workspace.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ModelError;

/// Stop sequence that keeps the model from writing its own observation.
pub const OBSERVATION_STOP: &str = "\nObservation";

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The rendered prompt text
    pub prompt: String,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// Create a request carrying the default `"\nObservation"` stop sequence.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            stop: vec![OBSERVATION_STOP.to_string()],
        }
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }
}

/// The core LanguageModel trait.
///
/// The agent loop calls `complete()` or `stream()` without knowing which
/// backend is being used.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Send a prompt and get the complete response text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;

    /// Send a prompt and get a stream of text chunks.
    ///
    /// Default implementation calls `complete()` and sends the result as a
    /// single chunk.
    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> Result<mpsc::Receiver<Result<String, ModelError>>, ModelError> {
        let text = self.complete(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }
}

/// Drain a chunk stream into one string, stopping at the first error.
pub async fn collect_stream(
    mut rx: mpsc::Receiver<Result<String, ModelError>>,
) -> Result<String, ModelError> {
    let mut text = String::new();
    while let Some(chunk) = rx.recv().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel;

    #[async_trait]
    impl LanguageModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
            Ok(format!("echo: {}", request.prompt))
        }
    }

    #[test]
    fn request_defaults_to_observation_stop() {
        let req = CompletionRequest::new("hi");
        assert_eq!(req.stop, vec!["\nObservation".to_string()]);
        let req = req.with_stop(vec![]);
        assert!(req.stop.is_empty());
    }

    #[tokio::test]
    async fn default_stream_wraps_complete() {
        let rx = FixedModel.stream(CompletionRequest::new("q")).await.unwrap();
        assert_eq!(collect_stream(rx).await.unwrap(), "echo: q");
    }

    #[tokio::test]
    async fn collect_stream_joins_chunks() {
        let (tx, rx) = mpsc::channel(4);
        for part in ["Final ", "Answer: ", "42"] {
            tx.send(Ok(part.to_string())).await.unwrap();
        }
        drop(tx);
        assert_eq!(collect_stream(rx).await.unwrap(), "Final Answer: 42");
    }

    #[tokio::test]
    async fn collect_stream_surfaces_interruption() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok("partial".to_string())).await.unwrap();
        tx.send(Err(ModelError::StreamInterrupted("reset".into())))
            .await
            .unwrap();
        drop(tx);
        let err = collect_stream(rx).await.unwrap_err();
        assert!(matches!(err, ModelError::StreamInterrupted(_)));
    }
}
