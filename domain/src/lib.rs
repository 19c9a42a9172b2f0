//! Domain layer for agent-roundtable
//!
//! This crate contains the pure logic of a roundtable: who takes part, how
//! their CLI output is turned into text, how that text is judged, and how the
//! shared discussion document evolves. It performs no I/O.
//!
//! # Core Concepts
//!
//! ## Participants and turns
//!
//! - [`Participant`]: one of a fixed set of agent CLIs
//! - [`TurnResult`]: the settled output of one invocation
//! - [`parse_output`]: per-CLI event-log parsing into clean text
//! - [`validate_output`]: emptiness / shortness / garbage checks
//!
//! ## Discussion
//!
//! - [`discussion::document`]: ordered section algebra for the markdown document
//! - [`DiscussionState`]: rounds, entries and speaker rotation
//! - [`analysis`]: continuation and input-gap response parsing
//! - [`WorkflowPhase`]: the top-level state machine's phases

pub mod analysis;
pub mod core;
pub mod discussion;
pub mod parser;
pub mod prompt;
pub mod turn;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use analysis::{ContinuationDecision, InputGap};
pub use core::{error::DomainError, participant::Participant, question::Question};
pub use discussion::{
    AppendOutcome, DiscussionState, DiscussionStatus, Entry, EntryState, Round, Section,
    speaking_order,
};
pub use parser::{ParseSource, ParsedOutput, has_response_content, parse_output};
pub use prompt::PromptTemplate;
pub use turn::{TurnOutcome, TurnResult};
pub use validation::{ScriptProfile, ValidationIssue, validate_output};
pub use workflow::{PhaseOutcome, QuestionState, ReadinessState, WorkflowPhase};
