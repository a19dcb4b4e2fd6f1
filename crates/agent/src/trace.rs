//! Prompt/response traces.
//!
//! Every prompt sent to the model and every raw response received is
//! appended to a per-run [`TraceRecorder`]. When the run ends, successfully
//! or not, the recorder is flushed to a [`TraceSink`] as one JSON line per
//! entry:
//!
//! ```text
//! {"role":"prompt","content":"Answer the following questions ..."}
//! {"role":"response","content":"Thought: ...\nAction: calculator\n..."}
//! ```
//!
//! The resulting files are used for offline inspection and for building
//! fine-tuning datasets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thinkloop_core::error::TraceError;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceRole {
    Prompt,
    Response,
}

/// A single trace line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub role: TraceRole,
    pub content: String,
}

impl TraceEntry {
    pub fn prompt(content: impl Into<String>) -> Self {
        Self {
            role: TraceRole::Prompt,
            content: content.into(),
        }
    }

    pub fn response(content: impl Into<String>) -> Self {
        Self {
            role: TraceRole::Response,
            content: content.into(),
        }
    }
}

/// Append-only persistence for flushed traces, keyed by query id.
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Append already-serialized JSON lines for `query_id`.
    async fn append(&self, query_id: &str, lines: &[String]) -> Result<(), TraceError>;
}

/// Per-run trace buffer.
///
/// Each `AgentLoop::run` owns its own recorder, so concurrent runs never
/// share trace state. A recorder without a sink records nothing.
pub struct TraceRecorder {
    sink: Option<Arc<dyn TraceSink>>,
    entries: Vec<TraceEntry>,
}

impl TraceRecorder {
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self {
            sink: Some(sink),
            entries: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn record(&mut self, entry: TraceEntry) {
        if self.is_enabled() {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Persist all buffered entries under `query_id`, then clear the buffer.
    ///
    /// The buffer is cleared even when the sink fails; the caller decides
    /// whether a failed flush matters.
    pub async fn flush(&mut self, query_id: &str) -> Result<(), TraceError> {
        let entries = std::mem::take(&mut self.entries);
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        if entries.is_empty() {
            return Ok(());
        }

        let lines = entries
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        sink.append(query_id, &lines).await?;
        debug!(query_id, entries = lines.len(), "Trace flushed");
        Ok(())
    }
}

impl std::fmt::Debug for TraceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceRecorder")
            .field("enabled", &self.is_enabled())
            .field("entries", &self.entries.len())
            .finish()
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────

/// Writes `<dir>/<query_id>.jsonl`, appending if the file already exists.
pub struct JsonlTraceSink {
    dir: PathBuf,
}

impl JsonlTraceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a query.
    ///
    /// Ids made only of alphanumerics, `-`, `_` and `.` are used as-is. Any
    /// other id has its unsafe characters replaced with `_` and gets a short
    /// hash of the original id appended, so distinct ids never share a file.
    pub fn path_for(&self, query_id: &str) -> PathBuf {
        let safe: String = query_id
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let safe = safe.trim_start_matches('.');
        let name = if safe.is_empty() { "trace" } else { safe };

        if name == query_id {
            self.dir.join(format!("{name}.jsonl"))
        } else {
            self.dir.join(format!("{name}-{}.jsonl", short_hash(query_id)))
        }
    }
}

/// First 4 bytes of the SHA-256 digest, as 8 lowercase hex chars.
fn short_hash(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl TraceSink for JsonlTraceSink {
    async fn append(&self, query_id: &str, lines: &[String]) -> Result<(), TraceError> {
        let io_err = |source| TraceError::Io {
            query_id: query_id.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(query_id))
            .await
            .map_err(io_err)?;
        file.write_all(content.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

/// Keeps flushed traces in memory, for tests and in-process inspection.
#[derive(Default)]
pub struct MemoryTraceSink {
    traces: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON lines flushed for `query_id`.
    pub fn lines(&self, query_id: &str) -> Vec<String> {
        self.traces
            .lock()
            .map(|t| t.get(query_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Flushed entries for `query_id`, decoded.
    pub fn entries(&self, query_id: &str) -> Vec<TraceEntry> {
        self.lines(query_id)
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn query_ids(&self) -> Vec<String> {
        self.traces
            .lock()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TraceSink for MemoryTraceSink {
    async fn append(&self, query_id: &str, lines: &[String]) -> Result<(), TraceError> {
        let mut traces = self.traces.lock().map_err(|_| TraceError::Io {
            query_id: query_id.to_string(),
            source: std::io::Error::other("trace store lock poisoned"),
        })?;
        traces
            .entry(query_id.to_string())
            .or_default()
            .extend(lines.iter().cloned());
        Ok(())
    }
}
