//! Participant CLI processes.
//!
//! [`InvocationTable`] says how each CLI is launched; [`ProcessAgentRunner`]
//! implements the [`AgentRunner`](roundtable_application::AgentRunner) port
//! on top of it.

mod runner;
mod templates;

pub use runner::ProcessAgentRunner;
pub use templates::{Invocation, InvocationTable, TemplateError};
