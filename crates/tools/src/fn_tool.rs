//! Closure-backed tools.
//!
//! `FnTool` turns an async closure into a [`Tool`], for capabilities that do
//! not deserve their own type:
//!
//! ```ignore
//! let foo = FnTool::new("foo", "Returns the value of foo.", |_input| async {
//!     Ok("baz".to_string())
//! });
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use thinkloop_core::error::ToolError;
use thinkloop_core::tool::Tool;

type Handler = dyn Fn(String) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync;

pub struct FnTool {
    name: String,
    description: String,
    handler: Box<Handler>,
}

impl FnTool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Box::new(move |input| Box::pin(f(input))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        (self.handler)(input.to_string()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn closure_receives_input() {
        let tool = FnTool::new("shout", "Uppercases input", |input: String| async move {
            Ok(input.to_uppercase())
        });
        assert_eq!(tool.name(), "shout");
        assert_eq!(tool.description(), "Uppercases input");
        assert_eq!(tool.invoke("hey").await.unwrap(), "HEY");
    }

    #[tokio::test]
    async fn closure_can_capture_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let tool = FnTool::new("count", "Counts calls", move |_input| {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst).to_string()) }
        });

        tool.invoke("").await.unwrap();
        assert_eq!(tool.invoke("").await.unwrap(), "1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn closure_errors_propagate() {
        let tool = FnTool::new("nope", "Always fails", |_input| async {
            Err(ToolError::InvalidInput("no".into()))
        });
        assert!(tool.invoke("x").await.is_err());
    }
}
