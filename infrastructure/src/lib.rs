//! Infrastructure layer for agent-roundtable
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: participant CLI processes, the discussion document on
//! disk, the JSONL event log, and configuration file loading.

pub mod agents;
pub mod config;
pub mod document;
pub mod logging;
pub mod workspace;

// Re-export commonly used types
pub use agents::{Invocation, InvocationTable, ProcessAgentRunner, TemplateError};
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use document::FsDiscussionStore;
pub use logging::JsonlEventLog;
pub use workspace::RunWorkspace;
