//! The ReAct agent loop for thinkloop.
//!
//! The agent follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Build a prompt** from the tool catalogue, chat history, the question
//!    and the scratchpad of earlier steps
//! 2. **Ask the model**, stopping before it writes its own `Observation`
//! 3. **Parse** the reply into a tool call or a final answer
//! 4. **If a tool call**: run the tool, append the observation, loop back to 1
//! 5. **If a final answer**: return it to the caller
//!
//! The loop continues until the model answers or the iteration limit is
//! reached. Every prompt and response can be traced to a [`TraceSink`].

pub mod loop_runner;
pub mod parser;
pub mod prompt;
pub mod trace;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, RunOptions, RunOutcome};
pub use parser::OutputParser;
pub use prompt::{PromptBuilder, PromptInput};
pub use trace::{JsonlTraceSink, MemoryTraceSink, TraceEntry, TraceRecorder, TraceRole, TraceSink};
pub use tokio_util::sync::CancellationToken;
