//! Model output parsing.
//!
//! The model answers in free text. [`OutputParser`] recognises two shapes:
//!
//! - a final answer, introduced by `Final Answer:`
//! - a tool call, `Action: <tool>\nAction Input: <input>`
//!
//! Anything else becomes a [`Decision::Fallback`] carrying the raw text, so a
//! malformed response still produces an answer.

use std::sync::LazyLock;

use regex_lite::Regex;
use thinkloop_core::agent::{Decision, FinalAnswer, ToolInvocation};
use tracing::warn;

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Tool name on the `Action:` line, input starts right after `Action Input:`.
static ACTION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Action: ([^\n]*)\nAction Input:[ \t]*").ok());

/// Marks a tool call that has already been answered.
const OBSERVATION_LABEL: &str = "\nObservation:";

/// Stateless parser for ReAct-formatted model output.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputParser;

impl OutputParser {
    pub fn new() -> Self {
        Self
    }

    /// Turn raw model text into a decision. Pure: the same text always yields
    /// the same decision.
    pub fn parse(&self, raw: &str) -> Decision {
        if let Some((_, answer)) = raw.rsplit_once(FINAL_ANSWER_MARKER) {
            return Decision::Finish(FinalAnswer {
                output: answer.trim().to_string(),
                log: raw.to_string(),
            });
        }

        if let Some((tool, tool_input)) = self.parse_action(raw) {
            return Decision::Act(ToolInvocation {
                tool,
                tool_input,
                log: raw.to_string(),
            });
        }

        warn!(
            output_len = raw.len(),
            "Model output matched neither grammar, using it as the final answer"
        );
        Decision::Fallback(FinalAnswer {
            output: raw.to_string(),
            log: raw.to_string(),
        })
    }

    /// Extract `(tool, input)` from the last `Action:` / `Action Input:` pair.
    ///
    /// The input runs to the end of the text and may span several lines. A
    /// pair already followed by an `Observation:` line belongs to rendered
    /// history and is not returned.
    pub fn parse_action(&self, raw: &str) -> Option<(String, String)> {
        let re = ACTION_RE.as_ref()?;
        let caps = re.captures_iter(raw).last()?;
        let whole = caps.get(0)?;
        let tool = caps.get(1)?.as_str().trim();
        let rest = &raw[whole.end()..];

        if rest.contains(OBSERVATION_LABEL) || tool.is_empty() {
            return None;
        }

        Some((tool.to_string(), strip_quotes(rest.trim()).to_string()))
    }
}

/// Remove one leading and one trailing double quote, each if present.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
