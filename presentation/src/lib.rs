//! Presentation layer for agent-roundtable
//!
//! This crate contains the CLI definition, progress reporters, the
//! clarification prompt and the result formatter.

pub mod clarify;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use clarify::{ClarificationRelay, ClarificationRequest, InteractiveClarifier};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
