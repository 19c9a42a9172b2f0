//! Logging infrastructure: the structured workflow event log.
//!
//! Provides [`JsonlEventLog`], a JSONL file writer that implements the
//! [`WorkflowObserver`](roundtable_application::WorkflowObserver) port.

mod event_log;

pub use event_log::JsonlEventLog;
