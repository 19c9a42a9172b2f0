//! Probe Readiness use case
//!
//! Sends a trivial prompt to each participant and marks it ready when the
//! reply contains the configured keyword. All probes run in parallel and
//! every participant ends in a terminal state.

use crate::config::WorkflowConfig;
use crate::ports::agent_runner::AgentRunner;
use crate::ports::progress::{NoProgress, WorkflowEvent, WorkflowObserver};
use roundtable_domain::{Participant, ReadinessState, WorkflowPhase};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub struct ProbeReadinessUseCase<R: AgentRunner + 'static> {
    runner: Arc<R>,
    observer: Arc<dyn WorkflowObserver>,
}

impl<R: AgentRunner + 'static> ProbeReadinessUseCase<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            observer: Arc::new(NoProgress),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn execute(
        &self,
        participants: &[Participant],
        config: &WorkflowConfig,
    ) -> BTreeMap<Participant, ReadinessState> {
        self.observer.on_event(&WorkflowEvent::PhaseChanged {
            phase: WorkflowPhase::Readiness,
        });

        let keyword = config.readiness.keyword.to_uppercase();
        let options = config
            .run_options(config.readiness.timeout)
            .with_label("readiness");

        let mut states = BTreeMap::new();
        let mut join_set = JoinSet::new();
        for &participant in participants {
            self.set(&mut states, participant, ReadinessState::Checking);
            let runner = Arc::clone(&self.runner);
            let prompt = config.readiness.prompt.clone();
            let options = options.clone();
            join_set.spawn(async move {
                let result = runner.run(participant, &prompt, &options).await;
                (participant, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let (participant, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Task join error: {}", e);
                    continue;
                }
            };
            let state = match result {
                Ok(turn) if turn.clean_text.to_uppercase().contains(&keyword) => {
                    info!("{} is ready", participant);
                    ReadinessState::Ready
                }
                Ok(turn) => {
                    warn!(
                        "{} replied without the readiness keyword: {:?}",
                        participant,
                        turn.clean_text.chars().take(80).collect::<String>()
                    );
                    ReadinessState::Failed
                }
                Err(e) => {
                    warn!("{} is not available: {}", participant, e);
                    ReadinessState::Failed
                }
            };
            self.set(&mut states, participant, state);
        }

        // Probes lost to a panicked task count as failed
        let unsettled: Vec<Participant> = states
            .iter()
            .filter(|(_, s)| !s.is_terminal())
            .map(|(p, _)| *p)
            .collect();
        for participant in unsettled {
            self.set(&mut states, participant, ReadinessState::Failed);
        }

        states
    }

    fn set(
        &self,
        states: &mut BTreeMap<Participant, ReadinessState>,
        participant: Participant,
        state: ReadinessState,
    ) {
        states.insert(participant, state);
        self.observer.on_event(&WorkflowEvent::ReadinessChanged { participant, state });
    }
}
