//! Raw TOML configuration data types
//!
//! These structs mirror the config file one to one. [`FileConfig::into_workflow_config`]
//! validates them and produces the immutable
//! [`WorkflowConfig`](roundtable_application::WorkflowConfig) a run uses.

use roundtable_application::{AnalysisConfig, ReadinessConfig, TimeoutConfig, WorkflowConfig};
use roundtable_domain::Participant;
use roundtable_domain::discussion::document::missing_sections;
use roundtable_domain::discussion::{DEFAULT_TEMPLATE, MAX_ROUNDS_CAP};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("discussion.max_rounds must be between 1 and {max}, got {got}")]
    InvalidMaxRounds { got: u32, max: u32 },

    #[error("unknown participant '{0}' (expected claude, codex or gemini)")]
    UnknownParticipant(String),

    #[error("discussion.participants cannot be empty")]
    NoParticipants,

    #[error("readiness.keyword cannot be empty")]
    EmptyKeyword,

    #[error("could not read template {path}: {message}")]
    TemplateUnreadable { path: PathBuf, message: String },

    #[error("template {path} lacks section(s): {}", .sections.join(", "))]
    TemplateMissingSections {
        path: PathBuf,
        sections: Vec<String>,
    },
}

/// `[discussion]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiscussionConfig {
    /// Round cap, 1..=10
    pub max_rounds: u32,
    /// Language tag for prompts and output validation
    pub language: String,
    pub enable_consensus: bool,
    pub enable_plan: bool,
    /// Who takes part, in canonical order
    pub participants: Vec<String>,
    /// Custom document template; the built-in one otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
    /// Extra instructions prepended to the initial question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for FileDiscussionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            language: "en".to_string(),
            enable_consensus: true,
            enable_plan: true,
            participants: Participant::ALL.iter().map(|p| p.to_string()).collect(),
            template_path: None,
            system_prompt: None,
        }
    }
}

/// `[timeouts]` section, all in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutConfig {
    pub idle_ms: u64,
    pub hard_ms: u64,
    pub question_ms: u64,
    pub turn_ms: u64,
}

impl Default for FileTimeoutConfig {
    fn default() -> Self {
        Self {
            idle_ms: 15_000,
            hard_ms: 900_000,
            question_ms: 300_000,
            turn_ms: 600_000,
        }
    }
}

/// `[analysis]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnalysisConfig {
    pub participant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub timeout_ms: u64,
    pub max_document_chars: usize,
}

impl Default for FileAnalysisConfig {
    fn default() -> Self {
        Self {
            participant: "claude".to_string(),
            model: Some("haiku".to_string()),
            timeout_ms: 60_000,
            max_document_chars: 40_000,
        }
    }
}

/// `[readiness]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReadinessConfig {
    pub keyword: String,
    pub prompt: String,
    pub timeout_ms: u64,
}

impl Default for FileReadinessConfig {
    fn default() -> Self {
        Self {
            keyword: "READY".to_string(),
            prompt: "Reply with the single word READY.".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// `[workspace]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkspaceConfig {
    /// Parent directory of the per-run directories
    pub root: PathBuf,
}

impl Default for FileWorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".roundtable"),
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub discussion: FileDiscussionConfig,
    pub timeouts: FileTimeoutConfig,
    pub analysis: FileAnalysisConfig,
    pub readiness: FileReadinessConfig,
    pub workspace: FileWorkspaceConfig,
}

impl FileConfig {
    /// Participants to invite, deduplicated and in canonical order
    pub fn participants(&self) -> Result<Vec<Participant>, ConfigValidationError> {
        let mut parsed = Vec::new();
        for name in &self.discussion.participants {
            let participant: Participant = name
                .parse()
                .map_err(|_| ConfigValidationError::UnknownParticipant(name.clone()))?;
            parsed.push(participant);
        }
        parsed.sort();
        parsed.dedup();
        if parsed.is_empty() {
            return Err(ConfigValidationError::NoParticipants);
        }
        Ok(parsed)
    }

    /// Validate and convert into the run configuration.
    ///
    /// Reads the custom template from disk when one is configured.
    pub fn into_workflow_config(&self) -> Result<WorkflowConfig, ConfigValidationError> {
        let t = &self.timeouts;
        for (name, value) in [
            ("timeouts.idle_ms", t.idle_ms),
            ("timeouts.hard_ms", t.hard_ms),
            ("timeouts.question_ms", t.question_ms),
            ("timeouts.turn_ms", t.turn_ms),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::InvalidTimeout(name));
            }
        }
        if self.analysis.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidTimeout("analysis.timeout_ms"));
        }
        if self.readiness.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidTimeout("readiness.timeout_ms"));
        }

        let max_rounds = self.discussion.max_rounds;
        if !(1..=MAX_ROUNDS_CAP).contains(&max_rounds) {
            return Err(ConfigValidationError::InvalidMaxRounds {
                got: max_rounds,
                max: MAX_ROUNDS_CAP,
            });
        }

        let analysis_participant: Participant = self.analysis.participant.parse().map_err(|_| {
            ConfigValidationError::UnknownParticipant(self.analysis.participant.clone())
        })?;

        if self.readiness.keyword.trim().is_empty() {
            return Err(ConfigValidationError::EmptyKeyword);
        }

        Ok(WorkflowConfig {
            max_rounds,
            language: self.discussion.language.clone(),
            enable_consensus: self.discussion.enable_consensus,
            enable_plan: self.discussion.enable_plan,
            template: self.load_template()?,
            system_prompt: self
                .discussion
                .system_prompt
                .clone()
                .filter(|s| !s.trim().is_empty()),
            timeouts: TimeoutConfig {
                idle: Duration::from_millis(t.idle_ms),
                hard: Duration::from_millis(t.hard_ms),
                question: Duration::from_millis(t.question_ms),
                turn: Duration::from_millis(t.turn_ms),
            },
            analysis: AnalysisConfig {
                participant: analysis_participant,
                model: self.analysis.model.clone().filter(|m| !m.trim().is_empty()),
                timeout: Duration::from_millis(self.analysis.timeout_ms),
                max_document_chars: self.analysis.max_document_chars,
            },
            readiness: ReadinessConfig {
                keyword: self.readiness.keyword.trim().to_string(),
                prompt: self.readiness.prompt.clone(),
                timeout: Duration::from_millis(self.readiness.timeout_ms),
            },
            ..WorkflowConfig::default()
        })
    }

    fn load_template(&self) -> Result<String, ConfigValidationError> {
        let Some(path) = &self.discussion.template_path else {
            return Ok(DEFAULT_TEMPLATE.to_string());
        };
        let template = std::fs::read_to_string(path).map_err(|e| {
            ConfigValidationError::TemplateUnreadable {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        let missing = missing_sections(&template);
        if !missing.is_empty() {
            return Err(ConfigValidationError::TemplateMissingSections {
                path: path.clone(),
                sections: missing.iter().map(|s| s.marker().to_string()).collect(),
            });
        }
        Ok(template)
    }
}
