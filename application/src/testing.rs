//! Hand-written port doubles shared by the use case tests

use crate::ports::agent_runner::{AgentRunner, RunError, RunOptions};
use crate::ports::discussion_store::{DiscussionStore, StoreError};
use crate::ports::progress::{WorkflowEvent, WorkflowObserver};
use async_trait::async_trait;
use roundtable_domain::discussion::document::{append_to_section, render_template};
use roundtable_domain::{
    AppendOutcome, DiscussionState, ParseSource, Participant, Section, TurnOutcome, TurnResult,
};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

type Script = dyn Fn(Participant, &str, &RunOptions) -> Result<TurnResult, RunError> + Send + Sync;

/// A successful turn with `text` as both raw and clean output
pub fn turn(participant: Participant, text: &str) -> TurnResult {
    TurnResult {
        participant,
        raw_output: text.to_string(),
        clean_text: text.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        outcome: TurnOutcome::Exited,
        parse_source: ParseSource::Streamed,
        elapsed: Duration::from_millis(10),
    }
}

/// Runner whose replies come from a closure; records every call
pub struct MockRunner {
    script: Box<Script>,
    pub calls: Mutex<Vec<(Participant, String, String)>>,
}

impl MockRunner {
    pub fn new(
        script: impl Fn(Participant, &str, &RunOptions) -> Result<TurnResult, RunError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Labels of the calls made to `participant`, in order
    pub fn labels_for(&self, participant: Participant) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| *p == participant)
            .map(|(_, label, _)| label.clone())
            .collect()
    }

    pub fn all_labels(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, label, _)| label.clone())
            .collect()
    }
}

#[async_trait]
impl AgentRunner for MockRunner {
    async fn run(
        &self,
        participant: Participant,
        prompt: &str,
        options: &RunOptions,
    ) -> Result<TurnResult, RunError> {
        self.calls
            .lock()
            .unwrap()
            .push((participant, options.label.clone(), prompt.to_string()));
        (self.script)(participant, prompt, options)
    }
}

/// In-memory store built on the same section algebra as the file store
#[derive(Default)]
pub struct MemoryStore {
    pub document: Mutex<Option<String>>,
    pub backups: Mutex<Vec<u32>>,
    pub plan: Mutex<Option<String>>,
    pub states: Mutex<Vec<DiscussionState>>,
    pub artifacts: Mutex<Vec<(Participant, String)>>,
}

impl MemoryStore {
    pub fn text(&self) -> String {
        self.document.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl DiscussionStore for MemoryStore {
    async fn initialize(
        &self,
        template: &str,
        substitutions: &[(&str, &str)],
    ) -> Result<PathBuf, StoreError> {
        let mut document = self.document.lock().unwrap();
        if document.is_some() {
            return Err(StoreError::AlreadyInitialized(PathBuf::from("memory")));
        }
        *document = Some(render_template(template, substitutions));
        Ok(PathBuf::from("memory/discussion.md"))
    }

    async fn append(
        &self,
        section: Section,
        heading: &str,
        content: &str,
    ) -> Result<AppendOutcome, StoreError> {
        let mut document = self.document.lock().unwrap();
        let current = document.clone().unwrap_or_default();
        let outcome = append_to_section(&current, section.marker(), heading, content);
        if let AppendOutcome::Inserted(updated) = &outcome {
            *document = Some(updated.clone());
        }
        Ok(outcome)
    }

    async fn read_document(&self) -> Result<String, StoreError> {
        Ok(self.text())
    }

    async fn backup(&self, round: u32) -> Result<PathBuf, StoreError> {
        self.backups.lock().unwrap().push(round);
        Ok(PathBuf::from(format!("memory/discussion.round-{}.bak.md", round)))
    }

    async fn write_plan(&self, plan: &str) -> Result<PathBuf, StoreError> {
        *self.plan.lock().unwrap() = Some(plan.to_string());
        Ok(PathBuf::from("memory/plan.md"))
    }

    async fn read_plan(&self) -> Result<Option<String>, StoreError> {
        Ok(self.plan.lock().unwrap().clone())
    }

    async fn save_state(&self, state: &DiscussionState) -> Result<(), StoreError> {
        self.states.lock().unwrap().push(state.clone());
        Ok(())
    }

    async fn save_turn_artifacts(&self, label: &str, turn: &TurnResult) -> Result<(), StoreError> {
        self.artifacts
            .lock()
            .unwrap()
            .push((turn.participant, label.to_string()));
        Ok(())
    }
}

/// Observer that keeps every event
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingObserver {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.kind()).collect()
    }
}

impl WorkflowObserver for RecordingObserver {
    fn on_event(&self, event: &WorkflowEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
