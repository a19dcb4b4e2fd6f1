//! Configuration loading, validation, and management for thinkloop.
//!
//! Loads configuration from `./thinkloop.toml` with environment variable
//! overrides. Validates all settings before an agent can be built from them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thinkloop_core::OBSERVATION_STOP;

/// The root configuration structure.
///
/// Maps directly to `thinkloop.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Prompt/response trace persistence
    #[serde(default)]
    pub trace: TraceConfig,

    /// Retrieval tool settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Iterations (prompt → model → dispatch) before a run is aborted
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Whether conversation history is rendered into the prompt
    #[serde(default = "default_true")]
    pub use_history: bool,

    /// Stop sequences sent with every completion request
    #[serde(default = "default_stop_sequences")]
    pub stop_sequences: Vec<String>,

    /// Use the model's streaming interface and reassemble the chunks
    #[serde(default)]
    pub stream: bool,
}

fn default_max_iterations() -> u32 {
    15
}
fn default_true() -> bool {
    true
}
fn default_stop_sequences() -> Vec<String> {
    vec![OBSERVATION_STOP.to_string()]
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            use_history: true,
            stop_sequences: default_stop_sequences(),
            stream: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding one `<query_id>.jsonl` file per query
    #[serde(default = "default_trace_dir")]
    pub dir: PathBuf,
}

fn default_trace_dir() -> PathBuf {
    PathBuf::from("logs").join("traces")
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_trace_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Vector collection queried by the knowledge search tool
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Hits returned per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_collection() -> String {
    "default".into()
}
fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            top_k: default_top_k(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `./thinkloop.toml`.
    ///
    /// Also checks environment variables:
    /// - `THINKLOOP_MAX_ITERATIONS`
    /// - `THINKLOOP_USE_HISTORY`
    /// - `THINKLOOP_TRACE`
    /// - `THINKLOOP_TRACE_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::default_path())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The default config file location.
    pub fn default_path() -> PathBuf {
        PathBuf::from("thinkloop.toml")
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("THINKLOOP_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "THINKLOOP_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(raw) = lookup("THINKLOOP_USE_HISTORY") {
            self.agent.use_history = parse_flag("THINKLOOP_USE_HISTORY", &raw)?;
        }
        if let Some(raw) = lookup("THINKLOOP_TRACE") {
            self.trace.enabled = parse_flag("THINKLOOP_TRACE", &raw)?;
        }
        if let Some(dir) = lookup("THINKLOOP_TRACE_DIR") {
            self.trace.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.trace.enabled && self.trace.dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "trace.dir must be set when tracing is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{key} must be a boolean flag, got '{raw}'"
        ))),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for thinkloop_core::Error {
    fn from(err: ConfigError) -> Self {
        thinkloop_core::Error::Config {
            message: err.to_string(),
        }
    }
}
