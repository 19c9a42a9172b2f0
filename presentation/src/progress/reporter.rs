//! Progress reporting for roundtable runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use roundtable_application::ports::progress::{WorkflowEvent, WorkflowObserver};
use roundtable_domain::{
    DiscussionStatus, EntryState, Participant, PhaseOutcome, QuestionState, ReadinessState,
    WorkflowPhase,
};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Reports progress with one spinner per busy participant
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<Participant, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("  {spinner:.green} {prefix:.bold} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }

    fn start(&self, participant: Participant, message: String) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = bars.remove(&participant) {
            old.finish_and_clear();
        }
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(participant.display_name().to_string());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        bars.insert(participant, pb);
    }

    fn finish(&self, participant: Participant, success: bool, detail: Option<&str>) {
        let pb = self
            .bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&participant);
        let mark = if success { "v".green() } else { "x".red() };
        let line = match detail {
            Some(detail) => format!("  {} {} {}", mark, participant.display_name(), detail.dimmed()),
            None => format!("  {} {}", mark, participant.display_name()),
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        self.println(line);
    }

    fn clear_all(&self) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, pb) in bars.drain() {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowObserver for ProgressReporter {
    fn on_event(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::PhaseChanged { phase } => match phase {
                // Rounds get their own header from RoundStarted
                WorkflowPhase::Discussion(_) | WorkflowPhase::Complete | WorkflowPhase::Failed => {}
                phase => self.println(format!("{} {}", "->".cyan(), phase_title(phase).bold())),
            },
            WorkflowEvent::ReadinessChanged { participant, state } => match state {
                ReadinessState::Checking => self.start(*participant, "probing".to_string()),
                ReadinessState::Ready => self.finish(*participant, true, Some("ready")),
                ReadinessState::Failed => self.finish(*participant, false, Some("not available")),
                ReadinessState::Pending => {}
            },
            WorkflowEvent::WorkspaceCreated { path } => {
                self.println(format!("   {} {}", "workspace:".dimmed(), path.display()));
            }
            WorkflowEvent::QuestionStateChanged {
                participant,
                state,
                error,
            } => match state {
                QuestionState::Running => self.start(*participant, "answering".to_string()),
                QuestionState::Succeeded => self.finish(*participant, true, None),
                QuestionState::Failed => self.finish(*participant, false, error.as_deref()),
                QuestionState::Pending => {}
            },
            WorkflowEvent::DocumentInitialized { path } => {
                self.println(format!("   {} {}", "document:".dimmed(), path.display()));
            }
            WorkflowEvent::EntryStateChanged {
                round,
                participant,
                state,
                error,
            } => match state {
                EntryState::Responding => {
                    let what = if *round == 0 {
                        "sharing initial view".to_string()
                    } else {
                        format!("speaking in round {}", round)
                    };
                    self.start(*participant, what);
                }
                EntryState::Done => self.finish(*participant, true, None),
                EntryState::Failed => self.finish(*participant, false, error.as_deref()),
                EntryState::Pending => {}
            },
            WorkflowEvent::RoundStarted { round, speakers } => {
                let order = speakers
                    .iter()
                    .map(|p| p.display_name())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                self.println(format!(
                    "{} {} {}",
                    "->".cyan(),
                    format!("Round {}", round).bold(),
                    order.dimmed()
                ));
            }
            WorkflowEvent::RoundCompleted {
                round,
                succeeded,
                failed,
            } if *failed > 0 => {
                self.println(format!(
                    "   round {}: {} spoke, {} failed",
                    round,
                    succeeded,
                    failed.to_string().red()
                ));
            }
            WorkflowEvent::ContinuationDecided { decision, .. } => {
                let verdict = if decision.should_continue {
                    "continuing".green()
                } else {
                    "stopping".yellow()
                };
                self.println(format!("   {}: {}", verdict, decision.reason.dimmed()));
            }
            WorkflowEvent::UserInputNeeded { .. } => self.clear_all(),
            WorkflowEvent::ConsensusStarted { participant } => {
                self.start(*participant, "writing consensus".to_string());
            }
            WorkflowEvent::PlanStarted { participant } => {
                self.start(*participant, "writing plan".to_string());
            }
            WorkflowEvent::ConsensusCompleted {
                participant,
                outcome,
            }
            | WorkflowEvent::PlanCompleted {
                participant,
                outcome,
                ..
            } => match participant {
                Some(p) => self.finish(*p, *outcome == PhaseOutcome::Succeeded, None),
                None => self.println(format!("  {} no participant available", "x".red())),
            },
            WorkflowEvent::WorkflowCompleted { status, error, .. } => {
                self.clear_all();
                if let Some(error) = error {
                    self.println(format!("{} {}", "x".red(), error.red()));
                } else {
                    self.println(format!("{} {}", "->".cyan(), status_label(*status)));
                }
            }
            _ => {}
        }
    }
}

/// Plain line-per-event progress (no spinners), for non-terminal output
pub struct SimpleProgress;

impl WorkflowObserver for SimpleProgress {
    fn on_event(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::PhaseChanged { phase } if !phase.is_terminal() => {
                eprintln!("-> {}", phase_title(phase));
            }
            WorkflowEvent::ReadinessChanged { participant, state } if state.is_terminal() => {
                eprintln!("   {}: {:?}", participant, state);
            }
            WorkflowEvent::QuestionStateChanged {
                participant,
                state,
                error,
            } if state.is_terminal() => match error {
                Some(error) => eprintln!("   {}: {:?} ({})", participant, state, error),
                None => eprintln!("   {}: {:?}", participant, state),
            },
            WorkflowEvent::EntryStateChanged {
                round,
                participant,
                state: EntryState::Failed,
                error,
            } => {
                eprintln!(
                    "   {} failed in round {}: {}",
                    participant,
                    round,
                    error.as_deref().unwrap_or("unknown error")
                );
            }
            WorkflowEvent::RoundCompleted {
                round,
                succeeded,
                failed,
            } => {
                eprintln!("   round {}: {} spoke, {} failed", round, succeeded, failed);
            }
            WorkflowEvent::ContinuationDecided { decision, .. } => {
                eprintln!(
                    "   continue: {} ({})",
                    decision.should_continue, decision.reason
                );
            }
            WorkflowEvent::WorkflowCompleted { status, error, .. } => match error {
                Some(error) => eprintln!("-> failed: {}", error),
                None => eprintln!("-> {}", status_label(*status)),
            },
            _ => {}
        }
    }
}

fn phase_title(phase: &WorkflowPhase) -> String {
    match phase {
        WorkflowPhase::Readiness => "Checking participant readiness".to_string(),
        WorkflowPhase::Workspace => "Preparing workspace".to_string(),
        WorkflowPhase::Questioning => "Asking the question".to_string(),
        WorkflowPhase::DiscussionInit => "Creating the discussion document".to_string(),
        WorkflowPhase::InitialViews => "Collecting initial views".to_string(),
        WorkflowPhase::Discussion(round) => format!("Discussion round {}", round),
        WorkflowPhase::Consensus => "Summarizing consensus".to_string(),
        WorkflowPhase::PlanGeneration => "Writing the execution plan".to_string(),
        WorkflowPhase::Complete => "Complete".to_string(),
        WorkflowPhase::Failed => "Failed".to_string(),
    }
}

fn status_label(status: DiscussionStatus) -> String {
    match status {
        DiscussionStatus::Completed => "Discussion completed".green().to_string(),
        DiscussionStatus::Skipped => "Discussion skipped (fewer than two participants)"
            .yellow()
            .to_string(),
        DiscussionStatus::Failed => "Discussion failed".red().to_string(),
        DiscussionStatus::Pending | DiscussionStatus::Running => format!("{:?}", status),
    }
}
