//! Use cases (application services)

pub mod analyze;
pub mod probe_readiness;
pub mod run_discussion;
