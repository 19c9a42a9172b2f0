//! Agent runner port
//!
//! Defines how the application layer gets one turn out of a participant CLI.
//! The process-backed adapter lives in the infrastructure layer.

use async_trait::async_trait;
use roundtable_domain::{Participant, TurnResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Why an invocation produced no usable result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("failed to spawn {participant}: {message}")]
    Spawn {
        participant: Participant,
        message: String,
    },

    #[error("hard timeout after {}s", .0.as_secs())]
    HardTimeout(Duration),

    #[error("exited with code {code:?} without output")]
    ExitedWithoutOutput { code: Option<i32>, stderr: String },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Options for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub cwd: PathBuf,
    /// Quiet period after answer text has started that ends the turn
    pub idle_timeout: Duration,
    /// Absolute ceiling for the whole invocation
    pub hard_timeout: Duration,
    pub env: Vec<(String, String)>,
    pub model: Option<String>,
    /// Raw output of anomalous turns is written here when set
    pub diagnostics_dir: Option<PathBuf>,
    /// Short tag for log lines and diagnostic file names (`round-2`, `plan`)
    pub label: String,
}

impl RunOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            idle_timeout: Duration::from_secs(15),
            hard_timeout: Duration::from_secs(600),
            env: Vec::new(),
            model: None,
            diagnostics_dir: None,
            label: "turn".to_string(),
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_hard_timeout(mut self, timeout: Duration) -> Self {
        self.hard_timeout = timeout;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_diagnostics_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.diagnostics_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Runs one participant invocation to completion.
///
/// Implementations hold no state between calls and may be invoked
/// concurrently for different participants.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Deliver `prompt` to `participant` and wait for the turn to settle
    async fn run(
        &self,
        participant: Participant,
        prompt: &str,
        options: &RunOptions,
    ) -> Result<TurnResult, RunError>;
}
