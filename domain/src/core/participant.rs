//! Participant value object representing one coding-agent CLI

use serde::{Deserialize, Serialize};

/// Agent identities that can take part in a roundtable (Value Object)
///
/// The set is fixed: each variant maps to one CLI whose invocation template
/// and output vocabulary are known ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Claude,
    Codex,
    Gemini,
}

impl Participant {
    /// Every participant in canonical order
    pub const ALL: [Participant; 3] = [Participant::Claude, Participant::Codex, Participant::Gemini];

    /// Preference order when choosing who writes the consensus summary
    pub const CONSENSUS_PREFERENCE: [Participant; 3] =
        [Participant::Claude, Participant::Gemini, Participant::Codex];

    /// Preference order when choosing who writes the execution plan
    pub const PLAN_PREFERENCE: [Participant; 3] =
        [Participant::Codex, Participant::Claude, Participant::Gemini];

    /// Get the string identifier for this participant
    pub fn as_str(&self) -> &'static str {
        match self {
            Participant::Claude => "claude",
            Participant::Codex => "codex",
            Participant::Gemini => "gemini",
        }
    }

    /// Human-facing name used in document headings
    pub fn display_name(&self) -> &'static str {
        match self {
            Participant::Claude => "Claude",
            Participant::Codex => "Codex",
            Participant::Gemini => "Gemini",
        }
    }

    /// Mention handle used by participants to address each other
    pub fn mention(&self) -> String {
        format!("@{}", self.as_str())
    }

    /// First participant in `preference` that appears in `eligible`
    pub fn first_preferred(
        preference: &[Participant],
        eligible: &[Participant],
    ) -> Option<Participant> {
        preference.iter().copied().find(|p| eligible.contains(p))
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Participant {
    type Err = crate::core::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Participant::Claude),
            "codex" => Ok(Participant::Codex),
            "gemini" => Ok(Participant::Gemini),
            other => Err(crate::core::error::DomainError::UnknownParticipant(
                other.to_string(),
            )),
        }
    }
}
