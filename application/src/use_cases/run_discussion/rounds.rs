//! Initial views and the discussion round loop.

use super::types::RunDiscussionError;
use super::{RunDiscussionUseCase, TurnFailure};
use crate::ports::agent_runner::AgentRunner;
use crate::ports::discussion_store::DiscussionStore;
use crate::ports::progress::WorkflowEvent;
use roundtable_domain::{
    DiscussionState, DiscussionStatus, EntryState, Participant, PromptTemplate, Section,
    WorkflowPhase,
};
use std::collections::BTreeMap;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

impl<R, S> RunDiscussionUseCase<R, S>
where
    R: AgentRunner + 'static,
    S: DiscussionStore + 'static,
{
    /// Each participant's first-look opinion on the document.
    ///
    /// Prompts share one snapshot and run concurrently; appends follow in
    /// `participants` order once every call has settled.
    pub(super) async fn phase_initial_views(&self, participants: &[Participant]) {
        self.set_phase(WorkflowPhase::InitialViews);

        let document = match self.store.read_document().await {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping initial views, document unreadable: {}", e);
                for &participant in participants {
                    self.emit_entry(0, participant, EntryState::Failed, Some(e.to_string()));
                }
                return;
            }
        };

        let hard_timeout = self.config.timeouts.turn;
        let mut join_set = JoinSet::new();
        for &participant in participants {
            self.emit_entry(0, participant, EntryState::Responding, None);
            let prompt = PromptTemplate::initial_view(participant, &document, &self.config.language);
            let turns = self.turns.clone();
            join_set.spawn(async move {
                let result = turns
                    .run(participant, &prompt, hard_timeout, "initial-view")
                    .await;
                (participant, result)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((participant, result)) => {
                    results.insert(participant, result);
                }
                Err(e) => warn!("Task join error: {}", e),
            }
        }

        for &participant in participants {
            match results.remove(&participant) {
                Some(Ok(text)) => {
                    self.append(Section::InitialViews, participant.display_name(), &text)
                        .await;
                    self.emit_entry(0, participant, EntryState::Done, None);
                }
                Some(Err(e)) => {
                    self.emit_entry(0, participant, EntryState::Failed, Some(e.to_string()));
                }
                None => {
                    self.emit_entry(
                        0,
                        participant,
                        EntryState::Failed,
                        Some("task aborted".to_string()),
                    );
                }
            }
        }
    }

    /// Bounded round loop.
    ///
    /// Per round: rotate speakers, back up the document, run speakers one by
    /// one against a freshly read document, then decide whether to go on.
    /// The cap is checked before continuation analysis, so analysis can
    /// only shorten the discussion.
    pub(super) async fn phase_discussion(
        &self,
        discussion: &mut DiscussionState,
    ) -> Result<(), RunDiscussionError> {
        loop {
            let (round, speakers) = {
                let round = discussion.begin_round();
                (round.number, round.speakers.clone())
            };
            self.set_phase(WorkflowPhase::Discussion(round));
            info!(
                "Round {}/{}: {}",
                round,
                discussion.max_rounds,
                speakers
                    .iter()
                    .map(Participant::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
            self.emit(WorkflowEvent::RoundStarted {
                round,
                speakers: speakers.clone(),
            });

            match self.store.backup(round).await {
                Ok(path) => debug!("Backed up document to {}", path.display()),
                Err(e) => warn!("Could not back up document before round {}: {}", round, e),
            }
            self.persist(discussion).await;

            for &speaker in &speakers {
                if let Some(r) = discussion.open_round_mut() {
                    r.mark_responding(speaker);
                }
                self.emit_entry(round, speaker, EntryState::Responding, None);

                match self.speak(speaker, &speakers, round, discussion.max_rounds).await {
                    Ok(text) => {
                        let heading = format!("Round {} - {}", round, speaker.display_name());
                        self.append(Section::DiscussionRounds, &heading, &text).await;
                        if let Some(r) = discussion.open_round_mut() {
                            r.mark_done(speaker, text);
                        }
                        self.emit_entry(round, speaker, EntryState::Done, None);
                    }
                    Err(e) => {
                        if let Some(r) = discussion.open_round_mut() {
                            r.mark_failed(speaker, e.to_string());
                        }
                        self.emit_entry(round, speaker, EntryState::Failed, Some(e.to_string()));
                    }
                }
                self.persist(discussion).await;
            }

            discussion.close_round();
            let (succeeded, all_failed) = discussion
                .last_round()
                .map(|r| (r.succeeded(), r.all_failed()))
                .unwrap_or((0, true));
            self.emit(WorkflowEvent::RoundCompleted {
                round,
                succeeded,
                failed: speakers.len() - succeeded,
            });
            self.persist(discussion).await;

            if all_failed {
                return Err(self
                    .abort(discussion, RunDiscussionError::RoundFailed { round })
                    .await);
            }

            if discussion.is_final_round() {
                info!("Reached the round cap ({})", discussion.max_rounds);
                break;
            }

            let document = match self.store.read_document().await {
                Ok(document) => document,
                Err(e) => {
                    warn!("Stopping discussion, document unreadable: {}", e);
                    break;
                }
            };

            let decision = self
                .analyzer
                .should_continue(&document, round, discussion.max_rounds)
                .await;
            self.emit(WorkflowEvent::ContinuationDecided {
                round,
                decision: decision.clone(),
            });
            if !decision.should_continue {
                break;
            }

            let gap = self.analyzer.find_input_gaps(&document, round).await;
            if gap.requires_pause()
                && let Err(e) = self.clarify(round, gap.questions).await
            {
                return Err(self.abort(discussion, e).await);
            }
        }

        discussion.finish(DiscussionStatus::Completed);
        self.persist(discussion).await;
        Ok(())
    }

    /// One speaker's turn against the current document
    async fn speak(
        &self,
        speaker: Participant,
        speakers: &[Participant],
        round: u32,
        max_rounds: u32,
    ) -> Result<String, TurnFailure> {
        let document = self
            .store
            .read_document()
            .await
            .map_err(|e| TurnFailure::Document(e.to_string()))?;
        let others: Vec<Participant> = speakers.iter().copied().filter(|p| *p != speaker).collect();
        let prompt = PromptTemplate::discussion_round(
            speaker,
            &others,
            round,
            max_rounds,
            &document,
            &self.config.language,
        );
        self.turns
            .run(
                speaker,
                &prompt,
                self.config.timeouts.turn,
                &format!("round-{}", round),
            )
            .await
    }

    fn emit_entry(
        &self,
        round: u32,
        participant: Participant,
        state: EntryState,
        error: Option<String>,
    ) {
        self.emit(WorkflowEvent::EntryStateChanged {
            round,
            participant,
            state,
            error,
        });
    }
}
