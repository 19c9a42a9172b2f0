//! Discussion document and discussion state

pub mod document;
pub mod state;

pub use document::{AppendOutcome, DEFAULT_TEMPLATE, PLAN_SECTIONS, Section};
pub use state::{
    DiscussionState, DiscussionStatus, Entry, EntryState, MAX_ROUNDS_CAP, Round, speaking_order,
};
