//! Decision and scratchpad types shared by the parser and the agent loop.

use serde::{Deserialize, Serialize};

/// A parsed request from the model to run one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool to run (must match a registered tool at dispatch time)
    pub tool: String,

    /// Plain-text input handed to the tool
    pub tool_input: String,

    /// The raw model text this invocation was parsed from
    pub log: String,
}

/// The answer a run ends with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub output: String,
    pub log: String,
}

/// What the model asked for on one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// `Action:` / `Action Input:` grammar matched.
    Act(ToolInvocation),

    /// `Final Answer:` marker found.
    Finish(FinalAnswer),

    /// Neither grammar matched; the raw text is used as the answer.
    Fallback(FinalAnswer),
}

impl Decision {
    /// Returns the final answer for both explicit and fallback finishes.
    pub fn final_answer(&self) -> Option<&FinalAnswer> {
        match self {
            Decision::Finish(answer) | Decision::Fallback(answer) => Some(answer),
            Decision::Act(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Decision::Fallback(_))
    }
}

/// One scratchpad entry: an action the loop dispatched and what came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStep {
    pub action: ToolInvocation,
    pub observation: String,
}
