//! Configuration file loading for agent-roundtable
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ROUNDTABLE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./roundtable.toml` or `./.roundtable.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-roundtable/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAnalysisConfig, FileConfig, FileDiscussionConfig,
    FileReadinessConfig, FileTimeoutConfig, FileWorkspaceConfig,
};
pub use loader::ConfigLoader;
