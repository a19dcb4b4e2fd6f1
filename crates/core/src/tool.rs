//! Tool trait — the abstraction over agent capabilities.
//!
//! A tool is a named, described, text-in/text-out function. The model picks
//! one by name in its `Action:` line and the registry dispatches to it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ToolError;

/// The core Tool trait.
///
/// Each tool (calculator, knowledge_search, closures wrapped in `FnTool`, ...)
/// implements this trait and is registered once at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (rendered into the prompt).
    fn description(&self) -> &str;

    /// Run the tool on plain-text input and return plain-text output.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

/// A registry of available tools.
///
/// Registration order is preserved: the prompt lists tools in the order they
/// were registered. Names are unique; the registry is read-only once it is
/// shared with an `AgentLoop`, so concurrent runs can dispatch through it.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// All tools, in registration order.
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch `input` to the tool called `name`.
    ///
    /// Any failure raised by the tool itself comes back as
    /// `ToolError::ExecutionFailed` naming the tool.
    pub async fn invoke(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tool.invoke(input).await.map_err(|e| match e {
            ToolError::ExecutionFailed { .. } => e,
            other => ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: other.to_string(),
            },
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
