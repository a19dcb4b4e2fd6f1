//! Prompt rendering.
//!
//! The prompt is assembled in a fixed order:
//!
//! 1. task prefix
//! 2. tool catalogue, one `name: description` line per tool
//! 3. chat history, one `role: content` line per message
//! 4. response format instructions naming the tools
//! 5. suffix carrying the current question
//! 6. scratchpad of prior `Action` / `Action Input` / `Observation` steps
//!
//! The format block and the scratchpad use the same labels that
//! [`OutputParser`](crate::parser::OutputParser) recognises.

use std::sync::Arc;
use thinkloop_core::agent::AgentStep;
use thinkloop_core::message::ConversationMessage;
use thinkloop_core::tool::Tool;

use crate::trace::{TraceEntry, TraceRecorder};

pub const DEFAULT_PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:\n";

pub const DEFAULT_HISTORY_HEADER: &str = "Here is the chat history: \n";

pub const DEFAULT_FORMAT_INSTRUCTIONS: &str = "Use the following format in your response.:
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question\n\n";

pub const DEFAULT_SUFFIX: &str = "Begin!\n\nQuestion: {input}\n";

/// Everything one prompt is rendered from.
#[derive(Clone, Copy)]
pub struct PromptInput<'a> {
    pub history: &'a [ConversationMessage],
    pub scratchpad: &'a [AgentStep],
    pub user_input: &'a str,
    pub tools: &'a [Arc<dyn Tool>],
}

/// Renders prompts from fixed templates. Stateless once built.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prefix: String,
    history_header: String,
    format_instructions: String,
    suffix: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.into(),
            history_header: DEFAULT_HISTORY_HEADER.into(),
            format_instructions: DEFAULT_FORMAT_INSTRUCTIONS.into(),
            suffix: DEFAULT_SUFFIX.into(),
        }
    }

    /// Replace the task instructions placed before the tool catalogue.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replace the question suffix. `{input}` is substituted with the question.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Render the full prompt.
    pub fn build(&self, input: &PromptInput<'_>) -> String {
        let mut out = String::with_capacity(1024);

        out.push_str(&self.prefix);
        for tool in input.tools {
            out.push('\n');
            out.push_str(tool.name());
            out.push_str(": ");
            out.push_str(tool.description());
        }
        out.push_str("\n\n");

        out.push_str(&self.history_header);
        out.push_str(&render_history(input.history));

        let tool_names = input
            .tools
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&self.format_instructions.replace("{tool_names}", &tool_names));
        out.push_str(&self.suffix.replace("{input}", input.user_input));
        out.push_str(&render_scratchpad(input.scratchpad));

        out
    }

    /// Render the prompt and record it as a `prompt` trace entry.
    pub fn build_traced(&self, input: &PromptInput<'_>, recorder: &mut TraceRecorder) -> String {
        let prompt = self.build(input);
        recorder.record(TraceEntry::prompt(&prompt));
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render history as `role: content` lines.
///
/// The most recent message is left out: callers append the current question
/// to their history before asking, and the question already appears in the
/// suffix.
pub fn render_history(history: &[ConversationMessage]) -> String {
    let shown = match history.split_last() {
        Some((_, earlier)) => earlier,
        None => history,
    };
    let mut out = shown
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// Render scratchpad steps in dispatch order.
pub fn render_scratchpad(steps: &[AgentStep]) -> String {
    steps
        .iter()
        .map(|step| {
            format!(
                "Action: {}\nAction Input: {}\nObservation: {}\n",
                step.action.tool, step.action.tool_input, step.observation
            )
        })
        .collect()
}
