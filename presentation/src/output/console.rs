//! Console output formatter for roundtable results

use colored::Colorize;
use roundtable_application::RunDiscussionOutput;
use roundtable_domain::{
    DiscussionStatus, EntryState, Participant, PhaseOutcome, ReadinessState,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Summary printed once the workflow reaches `Complete`
    pub fn format(question: &str, result: &RunDiscussionOutput, workspace: &Path) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Roundtable Results"));
        output.push('\n');

        output.push_str(&format!("{} {}\n\n", "Question:".cyan().bold(), question));
        output.push_str(&format!(
            "{} {}\n",
            "Participants:".cyan().bold(),
            result
                .state
                .participants
                .iter()
                .map(Participant::display_name)
                .collect::<Vec<_>>()
                .join(", ")
        ));
        output.push_str(&format!(
            "{} {} ({} of {} round(s))\n",
            "Discussion:".cyan().bold(),
            Self::status(result.status),
            result.total_rounds(),
            result.state.max_rounds
        ));

        if !result.state.rounds.is_empty() {
            output.push_str(&Self::section_header("Rounds"));
            for round in &result.state.rounds {
                let speakers = round
                    .speakers
                    .iter()
                    .map(|p| {
                        let name = p.display_name();
                        match round.entry(*p).map(|e| e.state) {
                            Some(EntryState::Done) => name.green().to_string(),
                            Some(EntryState::Failed) => name.red().to_string(),
                            _ => name.dimmed().to_string(),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" -> ");
                output.push_str(&format!("  Round {}: {}\n", round.number, speakers));
            }
        }

        output.push_str(&Self::section_header("Synthesis"));
        output.push_str(&format!(
            "  {:<10} {}\n",
            "Consensus",
            Self::outcome(result.consensus)
        ));
        output.push_str(&format!("  {:<10} {}\n", "Plan", Self::outcome(result.plan)));

        output.push_str(&Self::section_header("Artifacts"));
        output.push_str(&format!("  {:<10} {}\n", "Workspace", workspace.display()));
        output.push_str(&format!(
            "  {:<10} {}\n",
            "Document",
            result.document_path.display()
        ));
        if let Some(plan_path) = &result.plan_path {
            output.push_str(&format!("  {:<10} {}\n", "Plan", plan_path.display()));
        }

        output.push_str(&Self::footer());
        output
    }

    /// One line per participant after the readiness probe
    pub fn format_readiness(readiness: &BTreeMap<Participant, ReadinessState>) -> String {
        readiness
            .iter()
            .map(|(participant, state)| {
                let label = match state {
                    ReadinessState::Ready => "ready".green(),
                    ReadinessState::Failed => "unavailable".red(),
                    ReadinessState::Pending | ReadinessState::Checking => "pending".yellow(),
                };
                format!("  {:<8} {}", participant.display_name(), label)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn status(status: DiscussionStatus) -> String {
        match status {
            DiscussionStatus::Completed => "completed".green().to_string(),
            DiscussionStatus::Skipped => "skipped".yellow().to_string(),
            DiscussionStatus::Failed => "failed".red().to_string(),
            DiscussionStatus::Pending => "pending".dimmed().to_string(),
            DiscussionStatus::Running => "running".dimmed().to_string(),
        }
    }

    fn outcome(outcome: PhaseOutcome) -> String {
        match outcome {
            PhaseOutcome::Succeeded => "written".green().to_string(),
            PhaseOutcome::Failed => "failed".red().to_string(),
            PhaseOutcome::Disabled => "disabled".dimmed().to_string(),
            PhaseOutcome::NotRun => "not run".dimmed().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
