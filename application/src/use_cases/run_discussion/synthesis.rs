//! Consensus and plan generation. Both are best effort: a failure is
//! recorded and the run moves on.

use super::RunDiscussionUseCase;
use crate::ports::agent_runner::AgentRunner;
use crate::ports::discussion_store::DiscussionStore;
use crate::ports::progress::WorkflowEvent;
use roundtable_domain::discussion::document::missing_plan_sections;
use roundtable_domain::{Participant, PhaseOutcome, PromptTemplate, Section, WorkflowPhase};
use std::path::PathBuf;
use tracing::{info, warn};

impl<R, S> RunDiscussionUseCase<R, S>
where
    R: AgentRunner + 'static,
    S: DiscussionStore + 'static,
{
    pub(super) async fn phase_consensus(&self, eligible: &[Participant]) -> PhaseOutcome {
        self.set_phase(WorkflowPhase::Consensus);

        let Some(writer) = Participant::first_preferred(&Participant::CONSENSUS_PREFERENCE, eligible)
        else {
            warn!("No participant available to write the consensus");
            self.emit(WorkflowEvent::ConsensusCompleted {
                participant: None,
                outcome: PhaseOutcome::Failed,
            });
            return PhaseOutcome::Failed;
        };
        self.emit(WorkflowEvent::ConsensusStarted { participant: writer });

        let outcome = match self.synthesize(writer, "consensus", PromptTemplate::consensus).await {
            Some(text) => {
                let heading = format!("Consensus ({})", writer.display_name());
                self.append(Section::ConsensusSummary, &heading, &text).await;
                PhaseOutcome::Succeeded
            }
            None => PhaseOutcome::Failed,
        };

        self.emit(WorkflowEvent::ConsensusCompleted {
            participant: Some(writer),
            outcome,
        });
        outcome
    }

    pub(super) async fn phase_plan(
        &self,
        eligible: &[Participant],
    ) -> (PhaseOutcome, Option<PathBuf>) {
        self.set_phase(WorkflowPhase::PlanGeneration);

        let Some(writer) = Participant::first_preferred(&Participant::PLAN_PREFERENCE, eligible)
        else {
            warn!("No participant available to write the plan");
            self.emit(WorkflowEvent::PlanCompleted {
                participant: None,
                outcome: PhaseOutcome::Failed,
                path: None,
            });
            return (PhaseOutcome::Failed, None);
        };
        self.emit(WorkflowEvent::PlanStarted { participant: writer });

        let Some(plan) = self
            .synthesize(writer, "plan", PromptTemplate::execution_plan)
            .await
        else {
            self.emit(WorkflowEvent::PlanCompleted {
                participant: Some(writer),
                outcome: PhaseOutcome::Failed,
                path: None,
            });
            return (PhaseOutcome::Failed, None);
        };

        let missing = missing_plan_sections(&plan);
        if !missing.is_empty() {
            warn!("Plan from {} lacks sections: {}", writer, missing.join(", "));
        }

        let path = match self.store.write_plan(&plan).await {
            Ok(path) => {
                info!("Plan written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not write plan artifact: {}", e);
                None
            }
        };
        let heading = format!("Execution Plan ({})", writer.display_name());
        self.append(Section::ExecutionPlan, &heading, &plan).await;

        self.emit(WorkflowEvent::PlanCompleted {
            participant: Some(writer),
            outcome: PhaseOutcome::Succeeded,
            path: path.clone(),
        });
        (PhaseOutcome::Succeeded, path)
    }

    /// Run a whole-document synthesis prompt; `None` on any failure
    async fn synthesize(
        &self,
        writer: Participant,
        label: &str,
        build_prompt: fn(&str, &str) -> String,
    ) -> Option<String> {
        let document = match self.store.read_document().await {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping {}, document unreadable: {}", label, e);
                return None;
            }
        };
        let prompt = build_prompt(&document, &self.config.language);
        match self
            .turns
            .run(writer, &prompt, self.config.timeouts.hard, label)
            .await
        {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("{} by {} failed: {}", label, writer, e);
                None
            }
        }
    }
}
