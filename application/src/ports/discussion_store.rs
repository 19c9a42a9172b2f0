//! Discussion store port
//!
//! Owns the on-disk artifacts of one run: the discussion document, its
//! per-round backups, the plan, the state mirror and per-turn transcripts.
//! Section insertion itself is pure domain logic
//! ([`roundtable_domain::discussion::document`]); adapters only do I/O.

use async_trait::async_trait;
use roundtable_domain::{AppendOutcome, DiscussionState, Section, TurnResult};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("discussion document already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Persistence for one run's discussion artifacts
///
/// Appends are read-modify-write over the whole document. The store does
/// not lock; callers must keep at most one append in flight.
#[async_trait]
pub trait DiscussionStore: Send + Sync {
    /// Render `template` and write the document. Fails if it already exists.
    async fn initialize(
        &self,
        template: &str,
        substitutions: &[(&str, &str)],
    ) -> Result<PathBuf, StoreError>;

    /// Insert content at the end of `section`
    async fn append(
        &self,
        section: Section,
        heading: &str,
        content: &str,
    ) -> Result<AppendOutcome, StoreError>;

    /// Full current document content
    async fn read_document(&self) -> Result<String, StoreError>;

    /// Point-in-time copy of the document before `round` starts
    async fn backup(&self, round: u32) -> Result<PathBuf, StoreError>;

    /// Write the standalone plan artifact
    async fn write_plan(&self, plan: &str) -> Result<PathBuf, StoreError>;

    /// Plan text, if one was written
    async fn read_plan(&self) -> Result<Option<String>, StoreError>;

    /// Mirror the in-memory discussion state
    async fn save_state(&self, state: &DiscussionState) -> Result<(), StoreError>;

    /// Keep raw output, clean text and stderr of one turn
    async fn save_turn_artifacts(&self, label: &str, turn: &TurnResult) -> Result<(), StoreError>;
}
