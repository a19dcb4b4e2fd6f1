//! Shared test helpers for agent loop tests.

use async_trait::async_trait;
use std::sync::Mutex;
use thinkloop_core::error::{ModelError, ToolError, TraceError};
use thinkloop_core::model::{CompletionRequest, LanguageModel};
use thinkloop_core::tool::Tool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::trace::TraceSink;

/// A mock model that returns a sequence of scripted responses.
///
/// Each call to `complete` or `stream` returns the next response in the
/// script. With `repeat_last`, the final response is returned forever once
/// the script runs out; otherwise running out panics.
pub struct SequentialMockModel {
    responses: Vec<Result<String, ModelError>>,
    repeat_last: bool,
    call_count: Mutex<usize>,
    stream_calls: Mutex<usize>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl SequentialMockModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::scripted(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn scripted(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses,
            repeat_last: false,
            call_count: Mutex::new(0),
            stream_calls: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that gives the same answer on every call.
    pub fn always(text: &str) -> Self {
        let mut model = Self::new(vec![text]);
        model.repeat_last = true;
        model
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn stream_calls(&self) -> usize {
        *self.stream_calls.lock().unwrap()
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let mut count = self.call_count.lock().unwrap();
        self.requests.lock().unwrap().push(request);

        let index = if *count >= self.responses.len() {
            if !self.repeat_last || self.responses.is_empty() {
                panic!(
                    "SequentialMockModel: no more responses (call #{}, have {})",
                    *count,
                    self.responses.len()
                );
            }
            self.responses.len() - 1
        } else {
            *count
        };

        *count += 1;
        self.responses[index].clone()
    }
}

#[async_trait]
impl LanguageModel for SequentialMockModel {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        self.next(request)
    }

    /// Sends the scripted response in three-character chunks.
    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> Result<mpsc::Receiver<Result<String, ModelError>>, ModelError> {
        *self.stream_calls.lock().unwrap() += 1;
        let text = self.next(request)?;
        let chars: Vec<char> = text.chars().collect();
        let (tx, rx) = mpsc::channel(chars.len().max(1));
        for chunk in chars.chunks(3) {
            tx.send(Ok(chunk.iter().collect())).await.unwrap();
        }
        Ok(rx)
    }
}

/// Returns a fixed string, whatever the input.
pub struct EchoTool {
    pub name: &'static str,
    pub reply: &'static str,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Returns a fixed reply"
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        Ok(self.reply.to_string())
    }
}

/// Always fails with `InvalidInput`.
pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        Err(ToolError::InvalidInput(format!("cannot handle '{input}'")))
    }
}

/// Cancels `token` when invoked, then replies `"ok"`.
pub struct CancellingTool {
    pub token: CancellationToken,
}

#[async_trait]
impl Tool for CancellingTool {
    fn name(&self) -> &str {
        "stop"
    }

    fn description(&self) -> &str {
        "Cancels the current run"
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        self.token.cancel();
        Ok("ok".to_string())
    }
}

/// A trace sink whose every append fails; counts attempts.
#[derive(Default)]
pub struct FailingSink {
    attempts: Mutex<usize>,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl TraceSink for FailingSink {
    async fn append(&self, query_id: &str, _lines: &[String]) -> Result<(), TraceError> {
        *self.attempts.lock().unwrap() += 1;
        Err(TraceError::Io {
            query_id: query_id.to_string(),
            source: std::io::Error::other("disk full"),
        })
    }
}
