//! Application-level configuration.
//!
//! - [`WorkflowConfig`]: the immutable per-run snapshot the orchestrator reads

pub mod workflow_config;

pub use workflow_config::{AnalysisConfig, ReadinessConfig, TimeoutConfig, WorkflowConfig};
