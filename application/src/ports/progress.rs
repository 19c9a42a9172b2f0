//! Progress notification port
//!
//! The orchestrator reports every phase and turn transition as a
//! [`WorkflowEvent`]. Delivery is one-way and best effort: observers must
//! not block, and nothing waits for them. Observers that join late can
//! rebuild their view from the pull accessors on
//! [`WorkflowHandle`](crate::use_cases::run_discussion::WorkflowHandle).

use roundtable_domain::{
    ContinuationDecision, DiscussionStatus, EntryState, Participant, PhaseOutcome, QuestionState,
    ReadinessState, WorkflowPhase,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A workflow progress event.
///
/// Serialized with a `type` tag so the JSONL event log and any future web
/// transport share one wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    PhaseChanged {
        phase: WorkflowPhase,
    },
    ReadinessChanged {
        participant: Participant,
        state: ReadinessState,
    },
    WorkspaceCreated {
        path: PathBuf,
    },
    QuestionStateChanged {
        participant: Participant,
        state: QuestionState,
        error: Option<String>,
    },
    DocumentInitialized {
        path: PathBuf,
    },
    DocumentUpdated {
        content: String,
    },
    /// Initial views use round 0
    EntryStateChanged {
        round: u32,
        participant: Participant,
        state: EntryState,
        error: Option<String>,
    },
    RoundStarted {
        round: u32,
        speakers: Vec<Participant>,
    },
    RoundCompleted {
        round: u32,
        succeeded: usize,
        failed: usize,
    },
    ContinuationDecided {
        round: u32,
        decision: ContinuationDecision,
    },
    UserInputNeeded {
        round: u32,
        questions: Vec<String>,
    },
    UserInputReceived {
        round: u32,
        answers: BTreeMap<usize, String>,
    },
    ConsensusStarted {
        participant: Participant,
    },
    ConsensusCompleted {
        participant: Option<Participant>,
        outcome: PhaseOutcome,
    },
    PlanStarted {
        participant: Participant,
    },
    PlanCompleted {
        participant: Option<Participant>,
        outcome: PhaseOutcome,
        path: Option<PathBuf>,
    },
    WorkflowCompleted {
        status: DiscussionStatus,
        total_rounds: usize,
        error: Option<String>,
    },
}

impl WorkflowEvent {
    /// Event type identifier, matching the serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowEvent::PhaseChanged { .. } => "phase_changed",
            WorkflowEvent::ReadinessChanged { .. } => "readiness_changed",
            WorkflowEvent::WorkspaceCreated { .. } => "workspace_created",
            WorkflowEvent::QuestionStateChanged { .. } => "question_state_changed",
            WorkflowEvent::DocumentInitialized { .. } => "document_initialized",
            WorkflowEvent::DocumentUpdated { .. } => "document_updated",
            WorkflowEvent::EntryStateChanged { .. } => "entry_state_changed",
            WorkflowEvent::RoundStarted { .. } => "round_started",
            WorkflowEvent::RoundCompleted { .. } => "round_completed",
            WorkflowEvent::ContinuationDecided { .. } => "continuation_decided",
            WorkflowEvent::UserInputNeeded { .. } => "user_input_needed",
            WorkflowEvent::UserInputReceived { .. } => "user_input_received",
            WorkflowEvent::ConsensusStarted { .. } => "consensus_started",
            WorkflowEvent::ConsensusCompleted { .. } => "consensus_completed",
            WorkflowEvent::PlanStarted { .. } => "plan_started",
            WorkflowEvent::PlanCompleted { .. } => "plan_completed",
            WorkflowEvent::WorkflowCompleted { .. } => "workflow_completed",
        }
    }
}

/// Callback for workflow progress
///
/// Implementations live in the presentation and infrastructure layers
/// (console display, JSONL event log).
pub trait WorkflowObserver: Send + Sync {
    fn on_event(&self, event: &WorkflowEvent);
}

/// No-op observer for when progress reporting is not needed
pub struct NoProgress;

impl WorkflowObserver for NoProgress {
    fn on_event(&self, _event: &WorkflowEvent) {}
}

/// An observer that forwards every event to several observers in order
pub struct CompositeObserver {
    delegates: Vec<Arc<dyn WorkflowObserver>>,
}

impl CompositeObserver {
    pub fn new(delegates: Vec<Arc<dyn WorkflowObserver>>) -> Self {
        Self { delegates }
    }

    pub fn push(&mut self, observer: Arc<dyn WorkflowObserver>) {
        self.delegates.push(observer);
    }
}

impl WorkflowObserver for CompositeObserver {
    fn on_event(&self, event: &WorkflowEvent) {
        for d in &self.delegates {
            d.on_event(event);
        }
    }
}
