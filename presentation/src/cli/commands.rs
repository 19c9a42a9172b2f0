//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for agent-roundtable
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about = "Roundtable - coding-agent CLIs discuss a question and agree on a plan")]
#[command(long_about = r#"
Roundtable asks several coding-agent CLIs (claude, codex, gemini) the same
question, lets them debate it in a shared markdown document, and has them
write a consensus summary and an execution plan.

The workflow:
1. Readiness: each CLI is probed with a trivial prompt
2. Questioning: every ready participant answers the question in parallel
3. Initial views and discussion rounds: participants take turns in the document
4. Consensus and plan: one participant each synthesizes the discussion

Configuration files are loaded from (lowest to highest priority):
1. ~/.config/agent-roundtable/config.toml   Global config
2. ./roundtable.toml or ./.roundtable.toml  Project-level config
3. --config <path>                          Explicit config file
4. ROUNDTABLE_* environment variables (e.g. ROUNDTABLE_TIMEOUTS__IDLE_MS=5000)

Example:
  roundtable "How should we cache API responses in this service?"
  roundtable -p claude -p codex --max-rounds 2 "Split the monolith?"
  roundtable --non-interactive --no-plan "Review the error handling strategy"
"#)]
pub struct Cli {
    /// The question to discuss
    pub question: Option<String>,

    /// Participants to invite (can be specified multiple times)
    #[arg(short, long, value_name = "NAME")]
    pub participants: Vec<String>,

    /// Maximum number of discussion rounds (1-10)
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<u32>,

    /// Discussion language tag (en, ja, zh, ...)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Skip the consensus summary
    #[arg(long)]
    pub no_consensus: bool,

    /// Skip the execution plan
    #[arg(long)]
    pub no_plan: bool,

    /// Never pause for clarifications; gaps are answered with nothing
    #[arg(long)]
    pub non_interactive: bool,

    /// Treat every participant as ready without probing
    #[arg(long)]
    pub skip_readiness: bool,

    /// Directory under which run workspaces are created
    #[arg(long, value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Directory the agents run in (defaults to the current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
