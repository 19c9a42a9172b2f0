//! Per-run workspace directory.
//!
//! Every run gets `<root>/<timestamp>-<slug>/` holding the document, the
//! state mirror, the event log, the tracing log and one subdirectory per
//! participant for turn transcripts.

use roundtable_domain::Participant;
use std::path::{Path, PathBuf};
use tracing::debug;

const SLUG_MAX_CHARS: usize = 40;

pub const EVENTS_FILE: &str = "events.jsonl";
pub const LOG_FILE: &str = "roundtable.log";
pub const DIAGNOSTICS_DIR: &str = "diagnostics";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkspace {
    dir: PathBuf,
}

impl RunWorkspace {
    /// Create a fresh run directory under `root`.
    ///
    /// Two runs of the same question within one second get distinct
    /// directories through a numeric suffix.
    pub fn create(
        root: impl AsRef<Path>,
        question: &str,
        participants: &[Participant],
    ) -> std::io::Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let base = format!("{}-{}", stamp, slugify(question));
        let mut dir = root.join(&base);
        let mut attempt = 1;
        while dir.exists() {
            attempt += 1;
            dir = root.join(format!("{}-{}", base, attempt));
        }

        std::fs::create_dir_all(dir.join(DIAGNOSTICS_DIR))?;
        for participant in participants {
            std::fs::create_dir_all(dir.join(participant.as_str()))?;
        }
        debug!("Created run workspace {}", dir.display());

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn diagnostics_dir(&self) -> PathBuf {
        self.dir.join(DIAGNOSTICS_DIR)
    }
}

/// Lowercase ASCII words of `text` joined by `-`, at most 40 chars
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let extra = if slug.is_empty() { word.len() } else { word.len() + 1 };
        if slug.len() + extra > SLUG_MAX_CHARS {
            break;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word.to_ascii_lowercase());
    }
    if slug.is_empty() {
        slug.push_str("discussion");
    }
    slug
}
