//! File-backed [`DiscussionStore`].
//!
//! Layout inside the run directory:
//!
//! ```text
//! discussion.md                  the living document
//! discussion.round-N.bak.md      copy taken before round N
//! plan.md                        standalone execution plan
//! discussion-state.json          mirror of the discussion state
//! <participant>/<label>.raw.jsonl
//! <participant>/<label>.md
//! <participant>/<label>.stderr.log
//! ```

use async_trait::async_trait;
use roundtable_application::ports::discussion_store::{DiscussionStore, StoreError};
use roundtable_domain::discussion::document::{
    append_to_section, render_template, unresolved_placeholders,
};
use roundtable_domain::{AppendOutcome, DiscussionState, Section, TurnResult};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const DOCUMENT_FILE: &str = "discussion.md";
pub const PLAN_FILE: &str = "plan.md";
pub const STATE_FILE: &str = "discussion-state.json";

pub struct FsDiscussionStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles on the document
    write_lock: Mutex<()>,
}

impl FsDiscussionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }

    pub fn backup_path(&self, round: u32) -> PathBuf {
        self.dir.join(format!("discussion.round-{}.bak.md", round))
    }

    pub fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }
}

#[async_trait]
impl DiscussionStore for FsDiscussionStore {
    async fn initialize(
        &self,
        template: &str,
        substitutions: &[(&str, &str)],
    ) -> Result<PathBuf, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.document_path();
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?
        {
            return Err(StoreError::AlreadyInitialized(path));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let rendered = render_template(template, substitutions);
        let leftovers = unresolved_placeholders(&rendered);
        if !leftovers.is_empty() {
            warn!("Template placeholders left unresolved: {}", leftovers.join(", "));
        }

        self.write_atomic(&path, &rendered).await?;
        Ok(path)
    }

    async fn append(
        &self,
        section: Section,
        heading: &str,
        content: &str,
    ) -> Result<AppendOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.document_path();
        let current = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        let outcome = append_to_section(&current, section.marker(), heading, content);
        match &outcome {
            AppendOutcome::Inserted(updated) => {
                self.write_atomic(&path, updated).await?;
                debug!("Appended '{}' to {:?}", heading, section);
            }
            AppendOutcome::Skipped { chars } => {
                debug!("Skipped '{}' ({} chars)", heading, chars);
            }
        }
        Ok(outcome)
    }

    async fn read_document(&self) -> Result<String, StoreError> {
        let path = self.document_path();
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    async fn backup(&self, round: u32) -> Result<PathBuf, StoreError> {
        let _guard = self.write_lock.lock().await;
        let source = self.document_path();
        let target = self.backup_path(round);
        tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| StoreError::io(&target, e))?;
        Ok(target)
    }

    async fn write_plan(&self, plan: &str) -> Result<PathBuf, StoreError> {
        let path = self.plan_path();
        let mut content = plan.trim_end().to_string();
        content.push('\n');
        self.write_atomic(&path, &content).await?;
        Ok(path)
    }

    async fn read_plan(&self) -> Result<Option<String>, StoreError> {
        let path = self.plan_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(plan) => Ok(Some(plan)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    async fn save_state(&self, state: &DiscussionState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_atomic(&self.state_path(), &json).await
    }

    async fn save_turn_artifacts(&self, label: &str, turn: &TurnResult) -> Result<(), StoreError> {
        let dir = self.dir.join(turn.participant.as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let mut files = vec![
            (dir.join(format!("{}.raw.jsonl", label)), turn.raw_output.as_str()),
            (dir.join(format!("{}.md", label)), turn.clean_text.as_str()),
        ];
        if !turn.stderr.trim().is_empty() {
            files.push((dir.join(format!("{}.stderr.log", label)), turn.stderr.as_str()));
        }

        for (path, content) in files {
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
        }
        Ok(())
    }
}
