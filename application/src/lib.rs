//! Application layer for agent-roundtable
//!
//! This crate contains use cases, port definitions, and the workflow
//! configuration snapshot. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{AnalysisConfig, ReadinessConfig, TimeoutConfig, WorkflowConfig};
pub use ports::{
    agent_runner::{AgentRunner, RunError, RunOptions},
    discussion_store::{DiscussionStore, StoreError},
    progress::{CompositeObserver, NoProgress, WorkflowEvent, WorkflowObserver},
};
pub use use_cases::analyze::DiscussionAnalyzer;
pub use use_cases::probe_readiness::ProbeReadinessUseCase;
pub use use_cases::run_discussion::{
    Answers, ClarificationError, ClarificationSlot, RunDiscussionError, RunDiscussionInput,
    RunDiscussionOutput, RunDiscussionUseCase, TurnFailure, WorkflowHandle, WorkflowSnapshot,
};
