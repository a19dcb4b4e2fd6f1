//! The agent reasoning loop implementation.

use std::sync::Arc;
use thinkloop_config::{AgentConfig, AppConfig};
use thinkloop_core::agent::{AgentStep, Decision, FinalAnswer, ToolInvocation};
use thinkloop_core::message::ConversationMessage;
use thinkloop_core::model::{CompletionRequest, LanguageModel, collect_stream};
use thinkloop_core::tool::ToolRegistry;
use thinkloop_core::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::parser::OutputParser;
use crate::prompt::{PromptBuilder, PromptInput};
use crate::trace::{JsonlTraceSink, TraceEntry, TraceRecorder, TraceSink};

/// Per-call options for [`AgentLoop::run_with`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `agent.max_iterations` for this run
    pub max_iterations: Option<u32>,

    /// Trace key; a fresh UUID v4 when unset
    pub query_id: Option<String>,

    /// Checked before every iteration; in-flight calls are not interrupted
    pub cancel: Option<CancellationToken>,
}

impl RunOptions {
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_query_id(mut self, id: impl Into<String>) -> Self {
        self.query_id = Some(id.into());
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// The result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub query_id: String,
    pub answer: FinalAnswer,
    /// The answer is the raw model text because nothing parsed
    pub fallback: bool,
    /// Scratchpad at completion
    pub steps: Vec<AgentStep>,
    /// Model calls made
    pub iterations: u32,
}

/// The ReAct loop: prompt the model, parse its reply, run the requested
/// tool, feed the observation back, until the model gives a final answer.
pub struct AgentLoop {
    /// The language model backend
    model: Arc<dyn LanguageModel>,

    /// Tool registry, shared read-only between runs
    tools: Arc<ToolRegistry>,

    prompt: PromptBuilder,
    parser: OutputParser,
    config: AgentConfig,

    /// Where traces go; tracing is off when unset
    trace_sink: Option<Arc<dyn TraceSink>>,
}

impl AgentLoop {
    /// Create a loop with default agent settings and no tracing.
    pub fn new(model: Arc<dyn LanguageModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            tools,
            prompt: PromptBuilder::new(),
            parser: OutputParser::new(),
            config: AgentConfig::default(),
            trace_sink: None,
        }
    }

    /// Create a loop from a loaded config.
    ///
    /// The config is validated first; a `[trace]` section with `enabled = true`
    /// attaches a [`JsonlTraceSink`] writing under `trace.dir`.
    pub fn from_config(
        model: Arc<dyn LanguageModel>,
        tools: Arc<ToolRegistry>,
        config: &AppConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut agent = Self::new(model, tools).with_agent_config(config.agent.clone());
        if config.trace.enabled {
            agent = agent.with_trace_sink(Arc::new(JsonlTraceSink::new(&config.trace.dir)));
        }
        Ok(agent)
    }

    pub fn with_agent_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of iterations per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn with_prompt_builder(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// Record every prompt and response and flush them to `sink` per run.
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `input` given the prior conversation.
    pub async fn run(&self, history: &[ConversationMessage], input: &str) -> Result<RunOutcome> {
        self.run_with(history, input, RunOptions::default()).await
    }

    /// Answer `input` with per-call options.
    ///
    /// Fails with `Error::Model` when the model call fails,
    /// `Error::IterationLimitExceeded` when no final answer arrives in time
    /// and `Error::Cancelled` when the token fires between iterations. The
    /// trace is flushed on every path; a flush failure is logged only.
    pub async fn run_with(
        &self,
        history: &[ConversationMessage],
        input: &str,
        options: RunOptions,
    ) -> Result<RunOutcome> {
        let query_id = options
            .query_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let max_iterations = options.max_iterations.unwrap_or(self.config.max_iterations);
        let cancel = options.cancel.unwrap_or_default();

        info!(
            query_id = %query_id,
            model = self.model.name(),
            history = history.len(),
            max_iterations,
            "Starting agent run"
        );

        let mut recorder = match &self.trace_sink {
            Some(sink) => TraceRecorder::new(sink.clone()),
            None => TraceRecorder::disabled(),
        };

        let result = self
            .drive(history, input, max_iterations, &cancel, &query_id, &mut recorder)
            .await;

        if let Err(e) = recorder.flush(&query_id).await {
            warn!(query_id = %query_id, error = %e, "Failed to flush trace");
        }

        match &result {
            Ok(outcome) => info!(
                query_id = %query_id,
                iterations = outcome.iterations,
                steps = outcome.steps.len(),
                fallback = outcome.fallback,
                "Agent run finished"
            ),
            Err(e) => warn!(query_id = %query_id, error = %e, "Agent run aborted"),
        }

        result
    }

    async fn drive(
        &self,
        history: &[ConversationMessage],
        input: &str,
        max_iterations: u32,
        cancel: &CancellationToken,
        query_id: &str,
        recorder: &mut TraceRecorder,
    ) -> Result<RunOutcome> {
        let history: &[ConversationMessage] = if self.config.use_history {
            history
        } else {
            &[]
        };
        let mut steps: Vec<AgentStep> = Vec::new();

        for iteration in 1..=max_iterations {
            if cancel.is_cancelled() {
                info!(query_id, iteration, "Agent run cancelled");
                return Err(Error::Cancelled { steps });
            }

            debug!(query_id, iteration, steps = steps.len(), "Agent loop iteration");

            let prompt = self.prompt.build_traced(
                &PromptInput {
                    history,
                    scratchpad: &steps,
                    user_input: input,
                    tools: self.tools.list(),
                },
                recorder,
            );
            debug!(query_id, iteration, %prompt, "Prompt");

            let raw = self.complete(prompt).await?;
            recorder.record(TraceEntry::response(&raw));
            debug!(query_id, iteration, response = %raw, "Model response");

            match self.parser.parse(&raw) {
                Decision::Act(action) => {
                    let observation = self.dispatch(query_id, &action).await;
                    steps.push(AgentStep {
                        action,
                        observation,
                    });
                }
                Decision::Finish(answer) => {
                    return Ok(RunOutcome {
                        query_id: query_id.to_string(),
                        answer,
                        fallback: false,
                        steps,
                        iterations: iteration,
                    });
                }
                Decision::Fallback(answer) => {
                    warn!(query_id, iteration, "Returning unparsed model output as the answer");
                    return Ok(RunOutcome {
                        query_id: query_id.to_string(),
                        answer,
                        fallback: true,
                        steps,
                        iterations: iteration,
                    });
                }
            }
        }

        warn!(query_id, max_iterations, "Max iterations reached without a final answer");
        Err(Error::IterationLimitExceeded {
            max_iterations,
            steps,
        })
    }

    /// One model call, streamed and reassembled when `agent.stream` is set.
    async fn complete(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest::new(prompt).with_stop(self.config.stop_sequences.clone());
        if self.config.stream {
            let rx = self.model.stream(request).await?;
            Ok(collect_stream(rx).await?)
        } else {
            Ok(self.model.complete(request).await?)
        }
    }

    /// Run a tool. Failures become the observation so the model can recover.
    async fn dispatch(&self, query_id: &str, action: &ToolInvocation) -> String {
        debug!(query_id, tool = %action.tool, input = %action.tool_input, "Executing tool");
        match self.tools.invoke(&action.tool, &action.tool_input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(query_id, tool = %action.tool, error = %e, "Tool execution failed");
                e.to_string()
            }
        }
    }
}
