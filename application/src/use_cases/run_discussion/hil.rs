//! Human-in-the-loop clarification: pausing the round loop for user answers.
//!
//! ```text
//! round N complete
//!        ↓
//! gap analysis reports questions
//!        ↓
//! ClarificationSlot::request()  ──► UserInputNeeded event
//!        ↓ (suspended, no timeout)
//! WorkflowHandle::submit_answers()
//!        ↓
//! "User Clarifications" block appended, round N+1 starts
//! ```
//!
//! At most one request is outstanding. Submitting while nothing is pending
//! is ignored.

use super::RunDiscussionUseCase;
use super::types::RunDiscussionError;
use crate::ports::agent_runner::AgentRunner;
use crate::ports::discussion_store::DiscussionStore;
use crate::ports::progress::WorkflowEvent;
use roundtable_domain::Section;
use roundtable_domain::discussion::document::format_clarifications;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Answers keyed by 0-based question index
pub type Answers = BTreeMap<usize, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClarificationError {
    #[error("a clarification request is already pending")]
    AlreadyPending,

    #[error("clarification request was cancelled")]
    Cancelled,
}

/// Single-slot pending clarification request
#[derive(Debug, Default)]
pub struct ClarificationSlot {
    pending: Mutex<Option<oneshot::Sender<Answers>>>,
}

impl ClarificationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a request. A second request while one is pending is a bug in
    /// the caller, reported as [`ClarificationError::AlreadyPending`].
    pub fn request(&self) -> Result<oneshot::Receiver<Answers>, ClarificationError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(ClarificationError::AlreadyPending);
        }
        let (tx, rx) = oneshot::channel();
        *pending = Some(tx);
        Ok(rx)
    }

    /// Resolve the pending request. Returns `false` when nothing was pending.
    pub fn submit(&self, answers: Answers) -> bool {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(answers).is_ok(),
            None => false,
        }
    }

    /// Drop the pending request; the waiter resumes without answers
    pub fn cancel(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl<R, S> RunDiscussionUseCase<R, S>
where
    R: AgentRunner + 'static,
    S: DiscussionStore + 'static,
{
    /// Pause for answers to `questions`, then record them in the document.
    pub(super) async fn clarify(
        &self,
        round: u32,
        questions: Vec<String>,
    ) -> Result<(), RunDiscussionError> {
        let receiver = self.clarifications.request()?;

        self.snapshot
            .update(|s| s.pending_questions = questions.clone());
        info!(round, "Pausing for {} user clarification(s)", questions.len());
        self.emit(WorkflowEvent::UserInputNeeded {
            round,
            questions: questions.clone(),
        });

        let answers = match receiver.await {
            Ok(answers) => answers,
            Err(_) => {
                warn!(round, "Clarification request cancelled; continuing without answers");
                self.snapshot.update(|s| s.pending_questions.clear());
                return Ok(());
            }
        };
        self.snapshot.update(|s| s.pending_questions.clear());
        self.emit(WorkflowEvent::UserInputReceived {
            round,
            answers: answers.clone(),
        });

        let indexed: Vec<(usize, String)> = answers.into_iter().collect();
        let block = format_clarifications(&questions, &indexed);
        self.append(
            Section::DiscussionRounds,
            &format!("User Clarifications (after Round {})", round),
            &block,
        )
        .await;
        Ok(())
    }
}
