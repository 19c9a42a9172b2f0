//! Workflow-level phases and per-participant progress states

use serde::{Deserialize, Serialize};

/// Top-level workflow phase.
///
/// ```text
/// Readiness -> Workspace -> Questioning -> DiscussionInit -> InitialViews
///   -> Discussion(1..N) -> Consensus -> PlanGeneration -> Complete
/// ```
///
/// `Failed` is absorbing and reachable from Questioning, DiscussionInit and
/// Discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "round")]
pub enum WorkflowPhase {
    Readiness,
    Workspace,
    Questioning,
    DiscussionInit,
    InitialViews,
    Discussion(u32),
    Consensus,
    PlanGeneration,
    Complete,
    Failed,
}

impl WorkflowPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Complete | WorkflowPhase::Failed)
    }

    /// Whether a total failure in this phase may end the workflow as Failed
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            WorkflowPhase::Questioning | WorkflowPhase::DiscussionInit | WorkflowPhase::Discussion(_)
        )
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowPhase::Readiness => write!(f, "readiness"),
            WorkflowPhase::Workspace => write!(f, "workspace"),
            WorkflowPhase::Questioning => write!(f, "questioning"),
            WorkflowPhase::DiscussionInit => write!(f, "discussion-init"),
            WorkflowPhase::InitialViews => write!(f, "initial-views"),
            WorkflowPhase::Discussion(round) => write!(f, "discussion (round {})", round),
            WorkflowPhase::Consensus => write!(f, "consensus"),
            WorkflowPhase::PlanGeneration => write!(f, "plan-generation"),
            WorkflowPhase::Complete => write!(f, "complete"),
            WorkflowPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Readiness of a participant CLI, supplied by the readiness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    Pending,
    Checking,
    Ready,
    Failed,
}

impl ReadinessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReadinessState::Ready | ReadinessState::Failed)
    }
}

/// Progress of one participant on the initial question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl QuestionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestionState::Succeeded | QuestionState::Failed)
    }
}

/// State of an optional synthesis phase (consensus or plan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    NotRun,
    Disabled,
    Succeeded,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reachability() {
        assert!(WorkflowPhase::Questioning.can_fail());
        assert!(WorkflowPhase::Discussion(2).can_fail());
        assert!(!WorkflowPhase::Consensus.can_fail());
        assert!(!WorkflowPhase::PlanGeneration.can_fail());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_value(WorkflowPhase::Discussion(3)).unwrap();
        assert_eq!(json["phase"], "discussion");
        assert_eq!(json["round"], 3);
        assert_eq!(WorkflowPhase::Discussion(3).to_string(), "discussion (round 3)");
    }

    #[test]
    fn test_terminal_states() {
        assert!(ReadinessState::Failed.is_terminal());
        assert!(!ReadinessState::Checking.is_terminal());
        assert!(QuestionState::Succeeded.is_terminal());
        assert!(!QuestionState::Running.is_terminal());
    }
}
