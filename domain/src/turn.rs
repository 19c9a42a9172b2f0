//! Turn result value object: the settled output of one agent invocation.

use crate::core::participant::Participant;
use crate::parser::ParseSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a successful invocation settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Process exited with status 0
    Exited,
    /// Output went quiet after content started; the process was killed and
    /// the captured output treated as the full answer
    IdleSettled,
    /// Process exited non-zero but had produced stdout
    PartialSuccess,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::Exited => "exited",
            TurnOutcome::IdleSettled => "idle_settled",
            TurnOutcome::PartialSuccess => "partial_success",
        }
    }
}

/// Immutable result of one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub participant: Participant,
    pub raw_output: String,
    pub clean_text: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub outcome: TurnOutcome,
    pub parse_source: ParseSource,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl TurnResult {
    /// Whether the agent is known to have finished on its own.
    ///
    /// An idle-settled turn may be a complete answer or a stalled partial
    /// one; callers that care can check this flag.
    pub fn is_complete(&self) -> bool {
        self.outcome == TurnOutcome::Exited
    }

    /// Raw output present but the parser recovered nothing
    pub fn is_parse_anomaly(&self) -> bool {
        !self.raw_output.trim().is_empty() && self.clean_text.is_empty()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
