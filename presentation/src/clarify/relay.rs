//! Bridge from clarification pauses to the front end.
//!
//! The orchestrator announces a pause through `UserInputNeeded`; the relay
//! hands those requests to whichever task owns the terminal, which answers
//! through the `WorkflowHandle`.

use roundtable_application::ports::progress::{WorkflowEvent, WorkflowObserver};
use tokio::sync::mpsc;
use tracing::debug;

/// Questions the orchestrator is waiting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarificationRequest {
    pub round: u32,
    pub questions: Vec<String>,
}

/// Observer that forwards clarification pauses to a channel
pub struct ClarificationRelay {
    tx: mpsc::UnboundedSender<ClarificationRequest>,
}

impl ClarificationRelay {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClarificationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl WorkflowObserver for ClarificationRelay {
    fn on_event(&self, event: &WorkflowEvent) {
        if let WorkflowEvent::UserInputNeeded { round, questions } = event {
            let request = ClarificationRequest {
                round: *round,
                questions: questions.clone(),
            };
            // Receiver gone means the run is being torn down
            if self.tx.send(request).is_err() {
                debug!("Dropped clarification request for round {}", round);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::WorkflowPhase;

    #[test]
    fn test_forwards_only_input_requests() {
        let (relay, mut rx) = ClarificationRelay::channel();
        relay.on_event(&WorkflowEvent::PhaseChanged {
            phase: WorkflowPhase::Consensus,
        });
        relay.on_event(&WorkflowEvent::UserInputNeeded {
            round: 2,
            questions: vec!["Which database?".into()],
        });

        let request = rx.try_recv().unwrap();
        assert_eq!(request.round, 2);
        assert_eq!(request.questions, vec!["Which database?"]);
        assert!(rx.try_recv().is_err());
    }
}
