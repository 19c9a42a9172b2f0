//! Questioning phase: the initial question, fanned out to every ready participant.

use super::RunDiscussionUseCase;
use super::types::RunDiscussionInput;
use crate::ports::agent_runner::AgentRunner;
use crate::ports::discussion_store::DiscussionStore;
use crate::ports::progress::WorkflowEvent;
use roundtable_domain::{Participant, PromptTemplate, QuestionState, ReadinessState, WorkflowPhase};
use std::collections::BTreeMap;
use tokio::task::JoinSet;
use tracing::{info, warn};

impl<R, S> RunDiscussionUseCase<R, S>
where
    R: AgentRunner + 'static,
    S: DiscussionStore + 'static,
{
    /// Ask every ready participant in parallel.
    ///
    /// Returns the successful answers in canonical participant order.
    pub(super) async fn phase_questioning(
        &self,
        input: &RunDiscussionInput,
    ) -> Vec<(Participant, String)> {
        self.set_phase(WorkflowPhase::Questioning);

        let prompt = PromptTemplate::initial_question(
            input.question.content(),
            self.config.system_prompt.as_deref(),
            &self.config.language,
        );
        let hard_timeout = self.config.timeouts.question;

        let mut join_set = JoinSet::new();
        for (&participant, readiness) in &input.readiness {
            if *readiness != ReadinessState::Ready {
                self.set_question_state(
                    participant,
                    QuestionState::Failed,
                    Some(format!("not ready ({:?})", readiness)),
                );
                continue;
            }

            self.set_question_state(participant, QuestionState::Running, None);
            let turns = self.turns.clone();
            let prompt = prompt.clone();
            join_set.spawn(async move {
                let result = turns.run(participant, &prompt, hard_timeout, "question").await;
                (participant, result)
            });
        }

        let mut answers = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((participant, Ok(text))) => {
                    info!("{} answered the question", participant);
                    self.set_question_state(participant, QuestionState::Succeeded, None);
                    answers.insert(participant, text);
                }
                Ok((participant, Err(e))) => {
                    self.set_question_state(participant, QuestionState::Failed, Some(e.to_string()));
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        // A panicked task leaves its participant running; settle it
        let stranded: Vec<Participant> = self
            .handle()
            .state()
            .question_states
            .iter()
            .filter(|(_, s)| !s.is_terminal())
            .map(|(p, _)| *p)
            .collect();
        for participant in stranded {
            self.set_question_state(
                participant,
                QuestionState::Failed,
                Some("task aborted".to_string()),
            );
        }

        info!(
            "{} of {} participant(s) answered",
            answers.len(),
            input.readiness.len()
        );
        answers.into_iter().collect()
    }

    fn set_question_state(
        &self,
        participant: Participant,
        state: QuestionState,
        error: Option<String>,
    ) {
        self.snapshot.update(|s| {
            s.question_states.insert(participant, state);
        });
        self.emit(WorkflowEvent::QuestionStateChanged {
            participant,
            state,
            error,
        });
    }
}
