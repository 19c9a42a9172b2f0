//! JSONL file writer for workflow events.
//!
//! Each [`WorkflowEvent`] is serialized as a single JSON line carrying its
//! `type` tag plus a `timestamp`, appended via a buffered writer.

use roundtable_application::ports::progress::{WorkflowEvent, WorkflowObserver};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Event log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Create a new log writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &WorkflowEvent) -> Option<serde_json::Value> {
        let mut value = serde_json::to_value(event).ok()?;
        let map = value.as_object_mut()?;

        // The document is on disk already; keep the log small
        if let WorkflowEvent::DocumentUpdated { content } = event {
            map.remove("content");
            map.insert("chars".to_string(), content.chars().count().into());
        }

        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        map.insert("timestamp".to_string(), serde_json::Value::String(timestamp));
        Some(value)
    }
}

impl WorkflowObserver for JsonlEventLog {
    fn on_event(&self, event: &WorkflowEvent) {
        let Some(record) = Self::record(event) else {
            return;
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush every line so a crash still leaves a readable log
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{Participant, ReadinessState, WorkflowPhase};

    #[test]
    fn test_event_log_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = JsonlEventLog::new(&path).unwrap();

        log.on_event(&WorkflowEvent::PhaseChanged {
            phase: WorkflowPhase::Discussion(2),
        });
        log.on_event(&WorkflowEvent::ReadinessChanged {
            participant: Participant::Codex,
            state: ReadinessState::Ready,
        });
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("type").is_some());
            assert!(value.get("timestamp").is_some());
        }

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "phase_changed");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["participant"], "codex");
    }

    #[test]
    fn test_document_content_replaced_by_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = JsonlEventLog::new(&path).unwrap();
        log.on_event(&WorkflowEvent::DocumentUpdated {
            content: "# Roundtable".to_string(),
        });
        drop(log);

        let value: serde_json::Value =
            serde_json::from_str(std::fs::read_to_string(&path).unwrap().trim()).unwrap();
        assert_eq!(value["type"], "document_updated");
        assert_eq!(value["chars"], 12);
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/run/events.jsonl");
        let log = JsonlEventLog::new(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
        assert!(path.exists());
    }
}
