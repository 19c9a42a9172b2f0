//! Workflow configuration snapshot.
//!
//! [`WorkflowConfig`] is read once when a run starts and never changes while
//! the run is in flight. The infrastructure layer builds it from the merged
//! TOML / environment configuration.

use crate::ports::agent_runner::RunOptions;
use roundtable_domain::Participant;
use roundtable_domain::discussion::DEFAULT_TEMPLATE;
use roundtable_domain::validation::ScriptProfile;
use std::path::PathBuf;
use std::time::Duration;

/// Per-invocation timing limits.
///
/// | Field | Applies to |
/// |-------|------------|
/// | `idle` | every invocation, once answer text has started |
/// | `question` | hard ceiling for the initial question |
/// | `turn` | hard ceiling for initial views and discussion turns |
/// | `hard` | hard ceiling for consensus and plan synthesis |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub idle: Duration,
    pub hard: Duration,
    pub question: Duration,
    pub turn: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_millis(15_000),
            hard: Duration::from_millis(900_000),
            question: Duration::from_millis(300_000),
            turn: Duration::from_millis(600_000),
        }
    }
}

/// Settings for the continuation / gap analyzer calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub participant: Participant,
    pub model: Option<String>,
    pub timeout: Duration,
    pub max_document_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            participant: Participant::Claude,
            model: Some("haiku".to_string()),
            timeout: Duration::from_millis(60_000),
            max_document_chars: 40_000,
        }
    }
}

/// Settings for the readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub keyword: String,
    pub prompt: String,
    pub timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            keyword: "READY".to_string(),
            prompt: "Reply with the single word READY.".to_string(),
            timeout: Duration::from_millis(60_000),
        }
    }
}

/// Immutable configuration for one roundtable run
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub max_rounds: u32,
    /// BCP-47 style tag of the discussion language
    pub language: String,
    pub enable_consensus: bool,
    pub enable_plan: bool,
    /// Document template text with `{{placeholders}}`
    pub template: String,
    pub system_prompt: Option<String>,
    pub timeouts: TimeoutConfig,
    pub analysis: AnalysisConfig,
    pub readiness: ReadinessConfig,
    /// Directory the agents run in
    pub working_dir: PathBuf,
    /// Where raw output of anomalous turns is dumped
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            language: "en".to_string(),
            enable_consensus: true,
            enable_plan: true,
            template: DEFAULT_TEMPLATE.to_string(),
            system_prompt: None,
            timeouts: TimeoutConfig::default(),
            analysis: AnalysisConfig::default(),
            readiness: ReadinessConfig::default(),
            working_dir: PathBuf::from("."),
            diagnostics_dir: None,
        }
    }
}

impl WorkflowConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = Some(dir.into());
        self
    }

    pub fn with_consensus(mut self, enabled: bool) -> Self {
        self.enable_consensus = enabled;
        self
    }

    pub fn with_plan(mut self, enabled: bool) -> Self {
        self.enable_plan = enabled;
        self
    }

    // ==================== Derived Values ====================

    pub fn script_profile(&self) -> ScriptProfile {
        ScriptProfile::from_language(&self.language)
    }

    /// Invocation options for a call with the given hard ceiling
    pub fn run_options(&self, hard_timeout: Duration) -> RunOptions {
        let mut options = RunOptions::new(&self.working_dir)
            .with_idle_timeout(self.timeouts.idle)
            .with_hard_timeout(hard_timeout);
        if let Some(dir) = &self.diagnostics_dir {
            options = options.with_diagnostics_dir(dir);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.timeouts.idle, Duration::from_secs(15));
        assert_eq!(config.analysis.participant, Participant::Claude);
        assert_eq!(config.analysis.model.as_deref(), Some("haiku"));
        assert!(config.template.contains("## Execution Plan"));
    }

    #[test]
    fn test_run_options_carry_idle_and_diagnostics() {
        let config = WorkflowConfig::default()
            .with_working_dir("/tmp/project")
            .with_diagnostics_dir("/tmp/diag");
        let options = config.run_options(Duration::from_secs(42));
        assert_eq!(options.hard_timeout, Duration::from_secs(42));
        assert_eq!(options.idle_timeout, Duration::from_secs(15));
        assert_eq!(options.cwd, PathBuf::from("/tmp/project"));
        assert_eq!(options.diagnostics_dir, Some(PathBuf::from("/tmp/diag")));
    }
}
