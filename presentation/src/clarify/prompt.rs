//! Terminal prompt for clarification questions.
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   ?  The participants need your input (after round 2)
//! ═══════════════════════════════════════════════════════════════
//!
//! 1. Which database does the service use today?
//! answer> PostgreSQL 15
//!
//! 2. Is a brief outage acceptable during migration?
//! answer>
//! ```
//!
//! An empty answer leaves that question unanswered. `/skip` leaves all
//! remaining questions unanswered. End of input behaves like `/skip`.

use colored::Colorize;
use roundtable_application::Answers;
use std::io::{self, BufRead, Write};

pub struct InteractiveClarifier;

impl InteractiveClarifier {
    pub fn new() -> Self {
        Self
    }

    /// Ask on the process terminal. Blocking; call from `spawn_blocking`.
    pub fn ask(&self, round: u32, questions: &[String]) -> io::Result<Answers> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        self.ask_with(round, questions, &mut input, &mut output)
    }

    pub fn ask_with<R: BufRead, W: Write>(
        &self,
        round: u32,
        questions: &[String],
        input: &mut R,
        output: &mut W,
    ) -> io::Result<Answers> {
        let rule = "═══════════════════════════════════════════════════════════════"
            .yellow()
            .bold();
        writeln!(output)?;
        writeln!(output, "{}", rule)?;
        writeln!(
            output,
            "{}",
            format!("  ?  The participants need your input (after round {})", round)
                .yellow()
                .bold()
        )?;
        writeln!(output, "{}", rule)?;
        writeln!(
            output,
            "{}",
            "Press Enter to leave a question unanswered, /skip to skip the rest.".dimmed()
        )?;

        let mut answers = Answers::new();
        for (index, question) in questions.iter().enumerate() {
            writeln!(output)?;
            writeln!(output, "{} {}", format!("{}.", index + 1).cyan().bold(), question)?;
            write!(output, "{} ", "answer>".magenta().bold())?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let answer = line.trim();
            if answer.eq_ignore_ascii_case("/skip") {
                break;
            }
            if !answer.is_empty() {
                answers.insert(index, answer.to_string());
            }
        }

        writeln!(output)?;
        writeln!(
            output,
            "{}",
            format!("✓ {} of {} answered, resuming", answers.len(), questions.len()).green()
        )?;
        Ok(answers)
    }
}

impl Default for InteractiveClarifier {
    fn default() -> Self {
        Self::new()
    }
}
