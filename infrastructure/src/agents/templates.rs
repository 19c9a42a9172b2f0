//! Invocation templates: how each participant CLI is launched.
//!
//! The table is declarative so that a new CLI version only means a new
//! entry, never a change to the runner. Every template receives the prompt
//! on stdin.

use roundtable_domain::Participant;
use std::collections::BTreeMap;
use thiserror::Error;

/// Problems found while validating the table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no invocation template for {0}")]
    Missing(Participant),

    #[error("{0}: invocation template has an empty program")]
    EmptyProgram(Participant),

    #[error("{participant}: '{program}' not found on PATH")]
    ProgramNotFound {
        participant: Participant,
        program: String,
    },
}

/// Command line for one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Flag that precedes a model name (`--model`, `-m`); `None` when the
    /// CLI has no model switch
    pub model_flag: Option<String>,
    /// Arguments that must stay last (`-` for "read prompt from stdin")
    pub trailing_args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            model_flag: None,
            trailing_args: Vec::new(),
        }
    }

    pub fn with_model_flag(mut self, flag: impl Into<String>) -> Self {
        self.model_flag = Some(flag.into());
        self
    }

    pub fn with_trailing_args(mut self, args: &[&str]) -> Self {
        self.trailing_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Full argument list, with the model switch spliced in when both a
    /// flag and a model are present
    pub fn arguments(&self, model: Option<&str>) -> Vec<String> {
        let mut args = self.args.clone();
        if let (Some(flag), Some(model)) = (&self.model_flag, model) {
            args.push(flag.clone());
            args.push(model.to_string());
        }
        args.extend(self.trailing_args.iter().cloned());
        args
    }
}

/// Participant -> invocation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationTable {
    entries: BTreeMap<Participant, Invocation>,
}

impl Default for InvocationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl InvocationTable {
    /// Templates for the supported CLIs in their streaming JSON modes
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            Participant::Claude,
            Invocation::new("claude", &["-p", "--output-format", "stream-json", "--verbose"])
                .with_model_flag("--model"),
        );
        entries.insert(
            Participant::Codex,
            Invocation::new("codex", &["exec", "--json", "--skip-git-repo-check"])
                .with_model_flag("--model")
                .with_trailing_args(&["-"]),
        );
        entries.insert(
            Participant::Gemini,
            Invocation::new("gemini", &["--output-format", "stream-json"]).with_model_flag("-m"),
        );
        Self { entries }
    }

    /// An empty table, filled with [`with`](Self::with)
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Replace (or add) the template for one participant
    pub fn with(mut self, participant: Participant, invocation: Invocation) -> Self {
        self.entries.insert(participant, invocation);
        self
    }

    pub fn get(&self, participant: Participant) -> Option<&Invocation> {
        self.entries.get(&participant)
    }

    /// Check every requested participant once, before any run starts.
    ///
    /// Returns all problems rather than stopping at the first one so the
    /// user can fix their installation in one go.
    pub fn validate(&self, participants: &[Participant]) -> Vec<TemplateError> {
        let mut issues = Vec::new();
        for &participant in participants {
            let Some(invocation) = self.entries.get(&participant) else {
                issues.push(TemplateError::Missing(participant));
                continue;
            };
            if invocation.program.trim().is_empty() {
                issues.push(TemplateError::EmptyProgram(participant));
            } else if !is_command_available(&invocation.program) {
                issues.push(TemplateError::ProgramNotFound {
                    participant,
                    program: invocation.program.clone(),
                });
            }
        }
        issues
    }
}

fn is_command_available(command: &str) -> bool {
    which::which(command).is_ok()
}
