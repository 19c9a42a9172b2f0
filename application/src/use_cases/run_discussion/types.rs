//! Types for the RunDiscussion use case.

use super::hil::{Answers, ClarificationError, ClarificationSlot};
use crate::ports::discussion_store::StoreError;
use roundtable_domain::{
    DiscussionState, DiscussionStatus, DomainError, Participant, PhaseOutcome, QuestionState,
    Question, ReadinessState, WorkflowPhase,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors that end a run before it reaches `Complete`
#[derive(Error, Debug)]
pub enum RunDiscussionError {
    #[error("participants still probing readiness: {0:?}")]
    ReadinessPending(Vec<Participant>),

    #[error("no participant answered the initial question")]
    AllParticipantsFailed,

    #[error("failed to initialize discussion document: {0}")]
    DocumentInit(#[source] StoreError),

    #[error("every speaker failed in round {round}")]
    RoundFailed { round: u32 },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Clarification(#[from] ClarificationError),
}

/// Input for the RunDiscussion use case
#[derive(Debug, Clone)]
pub struct RunDiscussionInput {
    pub question: Question,
    /// Readiness per participant, from the readiness probe
    pub readiness: BTreeMap<Participant, ReadinessState>,
    /// Topic line for the document; defaults to the question summary
    pub topic: Option<String>,
}

impl RunDiscussionInput {
    /// Input with every participant marked ready
    pub fn new(question: Question) -> Self {
        Self {
            question,
            readiness: Participant::ALL
                .into_iter()
                .map(|p| (p, ReadinessState::Ready))
                .collect(),
            topic: None,
        }
    }

    pub fn with_readiness(mut self, readiness: BTreeMap<Participant, ReadinessState>) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn topic(&self) -> String {
        self.topic
            .clone()
            .unwrap_or_else(|| self.question.summary(80))
    }
}

/// Result of a run that reached `Complete`
#[derive(Debug, Clone)]
pub struct RunDiscussionOutput {
    pub status: DiscussionStatus,
    pub state: DiscussionState,
    pub document_path: PathBuf,
    pub consensus: PhaseOutcome,
    pub plan: PhaseOutcome,
    pub plan_path: Option<PathBuf>,
}

impl RunDiscussionOutput {
    pub fn total_rounds(&self) -> usize {
        self.state.total_rounds()
    }
}

/// Pull-based view of a run in progress
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub phase: WorkflowPhase,
    pub question_states: BTreeMap<Participant, QuestionState>,
    pub discussion: Option<DiscussionState>,
    /// Questions waiting for the user, empty unless paused
    pub pending_questions: Vec<String>,
    pub consensus: PhaseOutcome,
    pub plan: PhaseOutcome,
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Readiness,
            question_states: BTreeMap::new(),
            discussion: None,
            pending_questions: Vec::new(),
            consensus: PhaseOutcome::NotRun,
            plan: PhaseOutcome::NotRun,
        }
    }
}

/// Shared, lock-protected snapshot written by the orchestrator
#[derive(Debug, Default)]
pub(crate) struct SnapshotCell(Mutex<WorkflowSnapshot>);

impl SnapshotCell {
    pub(crate) fn update(&self, f: impl FnOnce(&mut WorkflowSnapshot)) {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    pub(crate) fn get(&self) -> WorkflowSnapshot {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Handle for observing and steering a run from outside its task
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    pub(crate) clarifications: Arc<ClarificationSlot>,
    pub(crate) snapshot: Arc<SnapshotCell>,
}

impl WorkflowHandle {
    /// Current phase, question states and discussion state
    pub fn state(&self) -> WorkflowSnapshot {
        self.snapshot.get()
    }

    /// Answer the pending clarification questions.
    ///
    /// Returns `false` (and does nothing) when no pause is active.
    pub fn submit_answers(&self, answers: Answers) -> bool {
        self.clarifications.submit(answers)
    }

    /// Resume a paused run without answers
    pub fn cancel_clarification(&self) -> bool {
        self.clarifications.cancel()
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.clarifications.is_pending()
    }
}
