//! Run Discussion use case
//!
//! Drives one roundtable from the initial question to the execution plan.
//!
//! | Phase                | Parallel | Failure policy                          |
//! |----------------------|----------|-----------------------------------------|
//! | Questioning          | yes      | zero successes aborts the run           |
//! | DiscussionInit       | -        | document write failure aborts the run   |
//! | InitialViews         | yes*     | failures skipped                        |
//! | Discussion(1..N)     | no       | a round where every speaker fails aborts|
//! | Consensus (optional) | -        | failure logged, run continues           |
//! | PlanGeneration (opt) | -        | failure logged, run continues           |
//!
//! *Initial-view prompts are built from one document snapshot and run
//! concurrently; their appends are applied afterwards in fixed participant
//! order. All other appends happen one at a time on this task, which is
//! what keeps the document free of concurrent read-modify-write.
//!
//! With fewer than two participants left after questioning there is nobody
//! to discuss with: initial views and rounds are skipped (status
//! `Skipped`), consensus and plan still run.

mod hil;
mod questioning;
mod rounds;
mod synthesis;
mod types;

pub use hil::{Answers, ClarificationError, ClarificationSlot};
pub use types::{
    RunDiscussionError, RunDiscussionInput, RunDiscussionOutput, WorkflowHandle, WorkflowSnapshot,
};

use crate::config::WorkflowConfig;
use crate::ports::agent_runner::{AgentRunner, RunError};
use crate::ports::discussion_store::{DiscussionStore, StoreError};
use crate::ports::progress::{NoProgress, WorkflowEvent, WorkflowObserver};
use crate::use_cases::analyze::DiscussionAnalyzer;
use chrono::Utc;
use roundtable_domain::validation::ScriptProfile;
use roundtable_domain::{
    AppendOutcome, DiscussionState, DiscussionStatus, ParseSource, Participant, PhaseOutcome,
    PromptTemplate, Section, ValidationIssue, WorkflowPhase, validate_output,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use types::SnapshotCell;

/// Why a single turn produced nothing usable
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnFailure {
    #[error(transparent)]
    Run(#[from] RunError),

    #[error("{0}")]
    Invalid(ValidationIssue),

    #[error("could not read discussion document: {0}")]
    Document(String),
}

/// Runs one validated turn. Cloneable so parallel phases can move it into
/// spawned tasks.
pub(crate) struct TurnExecutor<R: AgentRunner + 'static, S: DiscussionStore + 'static> {
    runner: Arc<R>,
    store: Arc<S>,
    config: Arc<WorkflowConfig>,
    profile: ScriptProfile,
}

impl<R: AgentRunner + 'static, S: DiscussionStore + 'static> Clone for TurnExecutor<R, S> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            profile: self.profile,
        }
    }
}

impl<R: AgentRunner + 'static, S: DiscussionStore + 'static> TurnExecutor<R, S> {
    /// Run, keep the transcript, validate. Returns the clean text.
    pub(crate) async fn run(
        &self,
        participant: Participant,
        prompt: &str,
        hard_timeout: Duration,
        label: &str,
    ) -> Result<String, TurnFailure> {
        let options = self.config.run_options(hard_timeout).with_label(label);
        let turn = self
            .runner
            .run(participant, prompt, &options)
            .await
            .inspect_err(|e| warn!("{} {} failed: {}", participant, label, e))?;

        if let Err(e) = self.store.save_turn_artifacts(label, &turn).await {
            warn!("Could not save {} transcript for {}: {}", label, participant, e);
        }

        debug!(
            participant = %participant,
            label,
            outcome = turn.outcome.as_str(),
            source = turn.parse_source.as_str(),
            elapsed_ms = turn.elapsed.as_millis() as u64,
            "Turn settled"
        );

        if turn.parse_source == ParseSource::Thinking {
            warn!(
                "{} {} produced no answer text; using its thinking output instead",
                participant, label
            );
        }

        if let Some(issue) = validate_output(&turn.clean_text, &self.profile) {
            warn!("{} {} rejected: {}", participant, label, issue);
            return Err(TurnFailure::Invalid(issue));
        }
        Ok(turn.clean_text)
    }
}

/// Use case for running a roundtable discussion
///
/// One instance per run: the instance owns the pause slot and the
/// progress snapshot for that run.
pub struct RunDiscussionUseCase<R: AgentRunner + 'static, S: DiscussionStore + 'static> {
    turns: TurnExecutor<R, S>,
    store: Arc<S>,
    config: Arc<WorkflowConfig>,
    analyzer: DiscussionAnalyzer<R>,
    observer: Arc<dyn WorkflowObserver>,
    clarifications: Arc<ClarificationSlot>,
    snapshot: Arc<SnapshotCell>,
}

impl<R: AgentRunner + 'static, S: DiscussionStore + 'static> RunDiscussionUseCase<R, S> {
    pub fn new(runner: Arc<R>, store: Arc<S>, config: WorkflowConfig) -> Self {
        let config = Arc::new(config);
        let analyzer = DiscussionAnalyzer::new(runner.clone(), &config);
        let turns = TurnExecutor {
            runner,
            store: store.clone(),
            config: config.clone(),
            profile: config.script_profile(),
        };
        Self {
            turns,
            store,
            config,
            analyzer,
            observer: Arc::new(NoProgress),
            clarifications: Arc::new(ClarificationSlot::new()),
            snapshot: Arc::new(SnapshotCell::default()),
        }
    }

    /// Set the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Handle for pulling state and answering clarification requests
    pub fn handle(&self) -> WorkflowHandle {
        WorkflowHandle {
            clarifications: self.clarifications.clone(),
            snapshot: self.snapshot.clone(),
        }
    }

    /// Current discussion document
    pub async fn document(&self) -> Result<String, StoreError> {
        self.store.read_document().await
    }

    /// Current plan, if one was written
    pub async fn plan(&self) -> Result<Option<String>, StoreError> {
        self.store.read_plan().await
    }

    /// Execute the whole workflow.
    ///
    /// Every run that gets past the readiness gate ends with exactly one
    /// `WorkflowCompleted` event, including failed runs.
    pub async fn execute(
        &self,
        input: RunDiscussionInput,
    ) -> Result<RunDiscussionOutput, RunDiscussionError> {
        let pending: Vec<Participant> = input
            .readiness
            .iter()
            .filter(|(_, state)| !state.is_terminal())
            .map(|(p, _)| *p)
            .collect();
        if !pending.is_empty() {
            return Err(RunDiscussionError::ReadinessPending(pending));
        }

        let mut discussion = DiscussionState::new(self.config.max_rounds, Vec::new())?;
        info!(
            "Starting roundtable with {} participant(s), max {} round(s)",
            input.readiness.len(),
            self.config.max_rounds
        );

        // Questioning
        let answers = self.phase_questioning(&input).await;
        if answers.is_empty() {
            return Err(self
                .abort(&mut discussion, RunDiscussionError::AllParticipantsFailed)
                .await);
        }
        let participants: Vec<Participant> = answers.iter().map(|(p, _)| *p).collect();
        discussion.participants = participants.clone();

        // DiscussionInit
        self.set_phase(WorkflowPhase::DiscussionInit);
        let document_path = match self.initialize_document(&input, &answers).await {
            Ok(path) => path,
            Err(e) => {
                return Err(self
                    .abort(&mut discussion, RunDiscussionError::DocumentInit(e))
                    .await);
            }
        };

        if participants.len() < 2 {
            info!(
                "Only {} participant(s) answered; skipping discussion",
                participants.len()
            );
            discussion.finish(DiscussionStatus::Skipped);
            self.persist(&discussion).await;
        } else {
            self.phase_initial_views(&participants).await;
            self.phase_discussion(&mut discussion).await?;
        }

        let consensus = if self.config.enable_consensus {
            self.phase_consensus(&participants).await
        } else {
            PhaseOutcome::Disabled
        };
        self.snapshot.update(|s| s.consensus = consensus);

        let (plan, plan_path) = if self.config.enable_plan {
            self.phase_plan(&participants).await
        } else {
            (PhaseOutcome::Disabled, None)
        };
        self.snapshot.update(|s| s.plan = plan);

        self.set_phase(WorkflowPhase::Complete);
        info!(
            status = ?discussion.status,
            rounds = discussion.total_rounds(),
            "Roundtable complete"
        );
        self.emit(WorkflowEvent::WorkflowCompleted {
            status: discussion.status,
            total_rounds: discussion.total_rounds(),
            error: None,
        });

        Ok(RunDiscussionOutput {
            status: discussion.status,
            state: discussion,
            document_path,
            consensus,
            plan,
            plan_path,
        })
    }

    async fn initialize_document(
        &self,
        input: &RunDiscussionInput,
        answers: &[(Participant, String)],
    ) -> Result<std::path::PathBuf, StoreError> {
        let topic = input.topic();
        let date = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
        let names = answers
            .iter()
            .map(|(p, _)| p.display_name())
            .collect::<Vec<_>>()
            .join(", ");
        let background = PromptTemplate::background(input.question.content(), answers);

        let path = self
            .store
            .initialize(
                &self.config.template,
                &[
                    ("topic", topic.as_str()),
                    ("date", date.as_str()),
                    ("participants", names.as_str()),
                    ("background", background.as_str()),
                ],
            )
            .await?;
        info!("Discussion document created at {}", path.display());
        self.emit(WorkflowEvent::DocumentInitialized { path: path.clone() });
        self.publish_document().await;
        Ok(path)
    }

    // ==================== Shared Helpers ====================

    fn emit(&self, event: WorkflowEvent) {
        self.observer.on_event(&event);
    }

    fn set_phase(&self, phase: WorkflowPhase) {
        info!("Phase: {}", phase);
        self.snapshot.update(|s| s.phase = phase);
        self.emit(WorkflowEvent::PhaseChanged { phase });
    }

    /// Mirror the discussion state to the snapshot and the store
    async fn persist(&self, discussion: &DiscussionState) {
        self.snapshot
            .update(|s| s.discussion = Some(discussion.clone()));
        if let Err(e) = self.store.save_state(discussion).await {
            warn!("Could not save discussion state: {}", e);
        }
    }

    /// Append to the document. Write failures drop the append.
    async fn append(&self, section: Section, heading: &str, content: &str) -> bool {
        match self.store.append(section, heading, content).await {
            Ok(AppendOutcome::Inserted(_)) => {
                self.publish_document().await;
                true
            }
            Ok(AppendOutcome::Skipped { chars }) => {
                debug!("Skipped append '{}' ({} chars)", heading, chars);
                false
            }
            Err(e) => {
                warn!("Dropped append '{}' to {:?}: {}", heading, section, e);
                false
            }
        }
    }

    async fn publish_document(&self) {
        match self.store.read_document().await {
            Ok(content) => self.emit(WorkflowEvent::DocumentUpdated { content }),
            Err(e) => warn!("Could not re-read discussion document: {}", e),
        }
    }

    /// End the run as failed. Still emits `WorkflowCompleted`.
    async fn abort(
        &self,
        discussion: &mut DiscussionState,
        error: RunDiscussionError,
    ) -> RunDiscussionError {
        warn!("Roundtable failed: {}", error);
        discussion.finish(DiscussionStatus::Failed);
        self.persist(discussion).await;
        self.set_phase(WorkflowPhase::Failed);
        self.emit(WorkflowEvent::WorkflowCompleted {
            status: DiscussionStatus::Failed,
            total_rounds: discussion.total_rounds(),
            error: Some(error.to_string()),
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, MockRunner, RecordingObserver, turn};
    use roundtable_domain::{Question, QuestionState, ReadinessState};
    use std::collections::BTreeMap;

    fn reply(p: Participant, label: &str) -> String {
        format!("{} speaking during {}: we should shard by tenant id.", p, label)
    }

    /// Normal replies for every turn; analysis answers from the given JSON
    fn scripted(
        continuation: &'static str,
        gap: &'static str,
        fails: impl Fn(Participant, &str) -> bool + Send + Sync + 'static,
    ) -> MockRunner {
        MockRunner::new(move |p, _prompt, options| {
            let label = options.label.as_str();
            if label.starts_with("continuation") {
                return Ok(turn(p, continuation));
            }
            if label.starts_with("gap") {
                return Ok(turn(p, gap));
            }
            if fails(p, label) {
                return Err(RunError::Spawn {
                    participant: p,
                    message: "not found".into(),
                });
            }
            Ok(turn(p, &reply(p, label)))
        })
    }

    struct Fixture {
        runner: Arc<MockRunner>,
        store: Arc<MemoryStore>,
        observer: Arc<RecordingObserver>,
        use_case: Arc<RunDiscussionUseCase<MockRunner, MemoryStore>>,
    }

    fn fixture(runner: MockRunner, config: WorkflowConfig) -> Fixture {
        let runner = Arc::new(runner);
        let store = Arc::new(MemoryStore::default());
        let observer = Arc::new(RecordingObserver::default());
        let use_case = Arc::new(
            RunDiscussionUseCase::new(runner.clone(), store.clone(), config)
                .with_observer(observer.clone()),
        );
        Fixture {
            runner,
            store,
            observer,
            use_case,
        }
    }

    fn input() -> RunDiscussionInput {
        RunDiscussionInput::new(Question::try_new("How should we shard the cache?").unwrap())
    }

    fn round_speakers(runner: &MockRunner, round: u32) -> Vec<Participant> {
        let wanted = format!("round-{}", round);
        let calls = runner.calls.lock().unwrap();
        calls
            .iter()
            .filter(|(_, label, _)| *label == wanted)
            .map(|(p, _, _)| *p)
            .collect()
    }

    /// Captured log output for assertions on diagnostics
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_thinking_fallback_is_flagged() {
        let runner = MockRunner::new(|p, _, _| {
            let mut result = turn(p, "Reasoning only: shard by tenant id with consistent hashing.");
            result.parse_source = ParseSource::Thinking;
            Ok(result)
        });
        let config = Arc::new(WorkflowConfig::default());
        let executor = TurnExecutor {
            runner: Arc::new(runner),
            store: Arc::new(MemoryStore::default()),
            profile: config.script_profile(),
            config,
        };

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let text = executor
            .run(Participant::Claude, "prompt", Duration::from_secs(5), "round-1")
            .await
            .unwrap();
        assert!(text.starts_with("Reasoning only"));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{}", output);
        assert!(output.contains("claude round-1 produced no answer text"), "{}", output);
    }

    #[tokio::test]
    async fn test_two_of_three_scenario() {
        let runner = scripted(
            r#"{"shouldContinue": true, "reason": "still disagreeing"}"#,
            "no json at all",
            |p, label| p == Participant::Gemini && label == "question",
        );
        let f = fixture(runner, WorkflowConfig::default().with_max_rounds(3));

        let output = f.use_case.execute(input()).await.unwrap();

        assert_eq!(output.status, DiscussionStatus::Completed);
        assert_eq!(output.total_rounds(), 3);
        assert_eq!(
            output.state.participants,
            vec![Participant::Claude, Participant::Codex]
        );

        // Gemini never speaks after failing the question
        assert_eq!(f.runner.labels_for(Participant::Gemini), vec!["question"]);

        // Rotation cycles between the two survivors
        let labels = f.runner.all_labels();
        assert_eq!(
            round_speakers(&f.runner, 1),
            vec![Participant::Claude, Participant::Codex]
        );
        assert_eq!(
            round_speakers(&f.runner, 2),
            vec![Participant::Codex, Participant::Claude]
        );
        assert_eq!(
            round_speakers(&f.runner, 3),
            vec![Participant::Claude, Participant::Codex]
        );

        // Cap wins over "continue": no analysis after the last round
        let continuation: Vec<_> = labels
            .iter()
            .filter(|l| l.starts_with("continuation"))
            .cloned()
            .collect();
        assert_eq!(continuation, vec!["continuation-1", "continuation-2"]);
        assert!(!labels.iter().any(|l| l == "round-4"));

        // Consensus by Claude, plan by Codex
        assert!(f.runner.labels_for(Participant::Claude).contains(&"consensus".to_string()));
        assert!(f.runner.labels_for(Participant::Codex).contains(&"plan".to_string()));
        assert_eq!(output.consensus, PhaseOutcome::Succeeded);
        assert_eq!(output.plan, PhaseOutcome::Succeeded);
        assert!(f.store.plan.lock().unwrap().is_some());
        assert_eq!(*f.store.backups.lock().unwrap(), vec![1, 2, 3]);

        let doc = f.store.text();
        let views = doc.find("## Initial Expert Views").unwrap();
        let rounds = doc.find("## Discussion Rounds").unwrap();
        let consensus = doc.find("## Consensus Summary").unwrap();
        assert!(views < doc.find("### Claude").unwrap());
        assert!(doc.find("### Codex").unwrap() < rounds);
        assert!(rounds < doc.find("### Round 1 - Claude").unwrap());
        assert!(doc.find("### Round 1 - Claude").unwrap() < doc.find("### Round 1 - Codex").unwrap());
        assert!(doc.find("### Round 3 - Codex").unwrap() < consensus);

        let kinds = f.observer.kinds();
        assert_eq!(kinds.last(), Some(&"workflow_completed"));
        assert_eq!(f.use_case.handle().state().phase, WorkflowPhase::Complete);
    }

    #[tokio::test]
    async fn test_later_speakers_see_earlier_appends() {
        let runner = scripted(r#"{"shouldContinue": false}"#, "{}", |_, _| false);
        let f = fixture(runner, WorkflowConfig::default().with_max_rounds(2));
        f.use_case.execute(input()).await.unwrap();

        let calls = f.runner.calls.lock().unwrap();
        let codex_round_one = calls
            .iter()
            .find(|(p, label, _)| *p == Participant::Codex && label == "round-1")
            .map(|(_, _, prompt)| prompt.clone())
            .unwrap();
        assert!(codex_round_one.contains(&reply(Participant::Claude, "round-1")));
        // Continuation said stop after round 1
        assert!(!calls.iter().any(|(_, label, _)| label == "round-2"));
    }

    #[tokio::test]
    async fn test_all_fail_round_aborts() {
        let runner = MockRunner::new(|p, _, options| {
            let label = options.label.as_str();
            if label.starts_with("continuation") {
                return Ok(turn(p, r#"{"shouldContinue": true, "reason": "go on"}"#));
            }
            if label.starts_with("gap") {
                return Ok(turn(p, r#"{"needsInput": false}"#));
            }
            if label == "round-2" {
                // Runs fine but says nothing useful
                return Ok(turn(p, "ok"));
            }
            Ok(turn(p, &reply(p, label)))
        });
        let f = fixture(runner, WorkflowConfig::default().with_max_rounds(5));

        let err = f.use_case.execute(input()).await.unwrap_err();
        assert!(matches!(err, RunDiscussionError::RoundFailed { round: 2 }));

        let labels = f.runner.all_labels();
        assert!(!labels.iter().any(|l| l == "round-3"));
        assert!(!labels.iter().any(|l| l == "consensus" || l == "plan"));

        let events = f.observer.events.lock().unwrap();
        match events.last() {
            Some(WorkflowEvent::WorkflowCompleted { status, total_rounds, error }) => {
                assert_eq!(*status, DiscussionStatus::Failed);
                assert_eq!(*total_rounds, 2);
                assert!(error.is_some());
            }
            other => panic!("unexpected last event: {:?}", other),
        }
        drop(events);
        let snapshot = f.use_case.handle().state();
        assert_eq!(snapshot.phase, WorkflowPhase::Failed);
        assert_eq!(snapshot.discussion.unwrap().status, DiscussionStatus::Failed);
    }

    #[tokio::test]
    async fn test_single_survivor_skips_discussion() {
        let runner = scripted("{}", "{}", |p, label| {
            p != Participant::Claude && label == "question"
        });
        let f = fixture(runner, WorkflowConfig::default());

        let output = f.use_case.execute(input()).await.unwrap();
        assert_eq!(output.status, DiscussionStatus::Skipped);
        assert_eq!(output.total_rounds(), 0);

        let labels = f.runner.all_labels();
        assert!(!labels.iter().any(|l| l.starts_with("round-") || l == "initial-view"));
        // Consensus and plan still run, both by the only survivor
        assert_eq!(
            f.runner.labels_for(Participant::Claude),
            vec!["question", "consensus", "plan"]
        );
        assert_eq!(output.plan, PhaseOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_no_answers_aborts_before_document() {
        let runner = scripted("{}", "{}", |_, _| true);
        let f = fixture(runner, WorkflowConfig::default());

        let err = f.use_case.execute(input()).await.unwrap_err();
        assert!(matches!(err, RunDiscussionError::AllParticipantsFailed));
        assert!(f.store.document.lock().unwrap().is_none());
        assert_eq!(f.observer.kinds().last(), Some(&"workflow_completed"));

        let states = f.use_case.handle().state().question_states;
        assert!(states.values().all(|s| *s == QuestionState::Failed));
    }

    #[tokio::test]
    async fn test_unready_participant_not_spawned() {
        let runner = scripted(r#"{"shouldContinue": false}"#, "{}", |_, _| false);
        let f = fixture(runner, WorkflowConfig::default().with_max_rounds(1));
        let readiness = BTreeMap::from([
            (Participant::Claude, ReadinessState::Ready),
            (Participant::Codex, ReadinessState::Ready),
            (Participant::Gemini, ReadinessState::Failed),
        ]);

        let output = f.use_case.execute(input().with_readiness(readiness)).await.unwrap();
        assert!(f.runner.labels_for(Participant::Gemini).is_empty());
        assert_eq!(output.total_rounds(), 1);
        assert_eq!(
            f.use_case.handle().state().question_states[&Participant::Gemini],
            QuestionState::Failed
        );
    }

    #[tokio::test]
    async fn test_readiness_gate() {
        let runner = scripted("{}", "{}", |_, _| false);
        let f = fixture(runner, WorkflowConfig::default());
        let readiness = BTreeMap::from([
            (Participant::Claude, ReadinessState::Ready),
            (Participant::Codex, ReadinessState::Checking),
        ]);

        let err = f.use_case.execute(input().with_readiness(readiness)).await.unwrap_err();
        assert!(matches!(err, RunDiscussionError::ReadinessPending(ref p) if p == &vec![Participant::Codex]));
        assert!(f.runner.all_labels().is_empty());
        assert!(f.observer.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_pause_for_clarification_then_resume() {
        let runner = scripted(
            r#"{"shouldContinue": true, "reason": "needs budget"}"#,
            r#"{"needsInput": true, "questions": ["What is the budget?"]}"#,
            |_, _| false,
        );
        let f = fixture(runner, WorkflowConfig::default().with_max_rounds(2));
        let handle = f.use_case.handle();
        assert!(!handle.submit_answers(Answers::new()));

        let use_case = f.use_case.clone();
        let run = tokio::spawn(async move { use_case.execute(input()).await });

        while !handle.is_waiting_for_input() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(handle.state().pending_questions, vec!["What is the budget?"]);
        assert!(handle.submit_answers(BTreeMap::from([(0, "About 2k USD a month".to_string())])));

        let output = run.await.unwrap().unwrap();
        assert_eq!(output.total_rounds(), 2);
        assert!(handle.state().pending_questions.is_empty());

        let doc = f.store.text();
        let block = doc.find("### User Clarifications (after Round 1)").unwrap();
        assert!(doc.contains("**A1.** About 2k USD a month"));
        assert!(doc.find("### Round 1 - Codex").unwrap() < block);
        assert!(block < doc.find("### Round 2 - Codex").unwrap());

        let kinds = f.observer.kinds();
        assert!(kinds.contains(&"user_input_needed"));
        assert!(kinds.contains(&"user_input_received"));
    }
}
