//! CLI entrypoint for agent-roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use roundtable_application::{
    Answers, CompositeObserver, ProbeReadinessUseCase, RunDiscussionInput, RunDiscussionUseCase,
    WorkflowEvent, WorkflowObserver,
};
use roundtable_domain::{Participant, Question, ReadinessState, WorkflowPhase};
use roundtable_infrastructure::workspace::LOG_FILE;
use roundtable_infrastructure::{
    ConfigLoader, FileConfig, FsDiscussionStore, InvocationTable, JsonlEventLog,
    ProcessAgentRunner, RunWorkspace, TemplateError,
};
use roundtable_presentation::{
    ClarificationRelay, Cli, ConsoleFormatter, InteractiveClarifier, ProgressReporter,
    SimpleProgress,
};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;
    let file_config = apply_overrides(file_config, &cli);

    if cli.print_config {
        println!("{}", ConfigLoader::describe_sources(cli.config.as_ref()));
        println!("{}", ConfigLoader::to_toml(&file_config)?);
        return Ok(());
    }

    let Some(question) = cli.question.clone() else {
        bail!("A question is required, e.g. roundtable \"How should we cache API responses?\"");
    };
    let question = Question::try_new(question)?;
    let participants = file_config.participants()?;
    let working_dir = match &cli.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Cannot determine the working directory")?,
    };

    // Validate before anything touches the disk
    let config = file_config.into_workflow_config()?;

    let workspace = RunWorkspace::create(&file_config.workspace.root, question.content(), &participants)
        .with_context(|| {
            format!(
                "Cannot create run workspace under {}",
                file_config.workspace.root.display()
            )
        })?;
    let _log_guard = init_tracing(cli.verbose, workspace.dir());
    info!("Starting agent-roundtable in {}", workspace.dir().display());

    let config = config
        .with_working_dir(working_dir)
        .with_diagnostics_dir(workspace.diagnostics_dir());

    // === Dependency Injection ===
    let table = InvocationTable::builtin();
    let missing = missing_programs(&table, &participants);
    let runner = Arc::new(ProcessAgentRunner::new(table));
    let store = Arc::new(FsDiscussionStore::new(workspace.dir()));

    let (relay, mut clarification_requests) = ClarificationRelay::channel();
    let mut observers: Vec<Arc<dyn WorkflowObserver>> = vec![Arc::new(relay)];
    if !cli.quiet {
        if std::io::stderr().is_terminal() {
            observers.push(Arc::new(ProgressReporter::new()));
        } else {
            observers.push(Arc::new(SimpleProgress));
        }
    }
    if let Some(log) = JsonlEventLog::new(workspace.events_path()) {
        observers.push(Arc::new(log));
    }
    let observer: Arc<dyn WorkflowObserver> = Arc::new(CompositeObserver::new(observers));

    // Readiness
    let readiness = if cli.skip_readiness {
        assume_ready(&participants, &missing)
    } else {
        let probable: Vec<Participant> = participants
            .iter()
            .copied()
            .filter(|p| !missing.contains(p))
            .collect();
        let mut states = ProbeReadinessUseCase::new(runner.clone())
            .with_observer(observer.clone())
            .execute(&probable, &config)
            .await;
        for p in &missing {
            states.insert(*p, ReadinessState::Failed);
        }
        states
    };
    if !readiness.values().any(|s| *s == ReadinessState::Ready) {
        eprintln!("{}", ConsoleFormatter::format_readiness(&readiness));
        bail!("No participant is ready; check that the agent CLIs are installed and logged in");
    }

    observer.on_event(&WorkflowEvent::PhaseChanged {
        phase: WorkflowPhase::Workspace,
    });
    observer.on_event(&WorkflowEvent::WorkspaceCreated {
        path: workspace.dir().to_path_buf(),
    });

    let use_case = RunDiscussionUseCase::new(runner, store, config).with_observer(observer);
    let handle = use_case.handle();
    let input = RunDiscussionInput::new(question.clone()).with_readiness(readiness);
    let mut run = tokio::spawn(async move { use_case.execute(input).await });

    let result = loop {
        tokio::select! {
            joined = &mut run => break joined?,
            Some(request) = clarification_requests.recv() => {
                if cli.non_interactive {
                    info!(round = request.round, "Non-interactive run; continuing without answers");
                    handle.submit_answers(Answers::new());
                    continue;
                }
                let answers = tokio::task::spawn_blocking(move || {
                    InteractiveClarifier::new().ask(request.round, &request.questions)
                })
                .await?;
                match answers {
                    Ok(answers) => {
                        handle.submit_answers(answers);
                    }
                    Err(e) => {
                        warn!("Could not read answers: {}", e);
                        handle.cancel_clarification();
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                // Dropping the run kills every agent process it owns
                run.abort();
                eprintln!("Interrupted. Partial results are in {}", workspace.dir().display());
                bail!("interrupted");
            }
        }
    };

    match result {
        Ok(output) => {
            println!(
                "{}",
                ConsoleFormatter::format(question.content(), &output, workspace.dir())
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Partial results are in {}", workspace.dir().display());
            Err(e.into())
        }
    }
}

/// Command-line flags win over every config source
fn apply_overrides(mut config: FileConfig, cli: &Cli) -> FileConfig {
    if !cli.participants.is_empty() {
        config.discussion.participants = cli.participants.clone();
    }
    if let Some(max_rounds) = cli.max_rounds {
        config.discussion.max_rounds = max_rounds;
    }
    if let Some(language) = &cli.language {
        config.discussion.language = language.clone();
    }
    if cli.no_consensus {
        config.discussion.enable_consensus = false;
    }
    if cli.no_plan {
        config.discussion.enable_plan = false;
    }
    if let Some(root) = &cli.workspace_root {
        config.workspace.root = root.clone();
    }
    config
}

/// Participants whose CLI cannot be found; reported once and never spawned
fn missing_programs(table: &InvocationTable, participants: &[Participant]) -> Vec<Participant> {
    table
        .validate(participants)
        .into_iter()
        .map(|issue| {
            warn!("{}", issue);
            match issue {
                TemplateError::Missing(p) | TemplateError::EmptyProgram(p) => p,
                TemplateError::ProgramNotFound { participant, .. } => participant,
            }
        })
        .collect()
}

fn assume_ready(
    participants: &[Participant],
    missing: &[Participant],
) -> BTreeMap<Participant, ReadinessState> {
    participants
        .iter()
        .map(|p| {
            let state = if missing.contains(p) {
                ReadinessState::Failed
            } else {
                ReadinessState::Ready
            };
            (*p, state)
        })
        .collect()
}

/// Console logging by verbosity (or `RUST_LOG`), plus a debug-level file
/// log inside the run workspace
fn init_tracing(verbose: u8, dir: &Path) -> WorkerGuard {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let file_level = if verbose >= 3 { "trace" } else { "debug" };

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new(file_level)),
        )
        .init();

    guard
}
