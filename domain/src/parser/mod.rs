//! Output parsing for agent CLI event logs.
//!
//! Every participant streams a newline-delimited event log on stdout. Most
//! lines are JSON objects, but CLIs also print banners, progress lines or
//! half-written JSON when they are killed mid-stream. These functions turn
//! that log into the single text answer the participant meant to give.
//!
//! # Resolution order
//!
//! | Priority | Source | [`ParseSource`] |
//! |----------|--------|-----------------|
//! | 1 | incremental deltas, joined in arrival order | `Streamed` |
//! | 2 | complete assistant messages, joined by blank lines | `Streamed` |
//! | 3 | final / summary event | `Final` |
//! | 4 | thinking text (Claude only) | `Thinking` |
//! | 5 | non-JSON lines, control sequences stripped | `PlainText` |
//!
//! Vocabularies differ per CLI, so each participant has its own collector
//! module. The same modules provide the cheap content probe the runner uses
//! to decide when to arm its idle timer ([`has_response_content`]).

mod claude;
mod codex;
mod gemini;
mod plain;

use crate::core::participant::Participant;
use serde::{Deserialize, Serialize};

pub use plain::strip_control_sequences;

/// Where the parsed text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    /// Streamed deltas or complete assistant messages
    Streamed,
    /// A final / task-complete event's full message field
    Final,
    /// Reasoning text used because no answer text was emitted
    Thinking,
    /// Non-JSON stdout lines
    PlainText,
    /// Nothing usable was found
    Empty,
}

impl ParseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseSource::Streamed => "streamed",
            ParseSource::Final => "final",
            ParseSource::Thinking => "thinking",
            ParseSource::PlainText => "plain_text",
            ParseSource::Empty => "empty",
        }
    }
}

/// Clean text extracted from a raw event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    pub text: String,
    pub source: ParseSource,
}

impl ParsedOutput {
    fn empty() -> Self {
        Self {
            text: String::new(),
            source: ParseSource::Empty,
        }
    }

    /// True when the text is reasoning rather than an answer
    pub fn is_thinking_fallback(&self) -> bool {
        self.source == ParseSource::Thinking
    }
}

/// Text fragments gathered while scanning one event log
#[derive(Debug, Default)]
pub(crate) struct Fragments {
    deltas: String,
    messages: Vec<String>,
    final_message: Option<String>,
    thinking: String,
    plain: Vec<String>,
}

impl Fragments {
    pub(crate) fn push_delta(&mut self, text: &str) {
        self.deltas.push_str(text);
    }

    pub(crate) fn push_message(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.messages.push(text.to_string());
        }
    }

    pub(crate) fn set_final(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.final_message = Some(text.to_string());
        }
    }

    pub(crate) fn push_thinking(&mut self, text: &str) {
        self.thinking.push_str(text);
    }

    fn resolve(self, allow_thinking: bool) -> ParsedOutput {
        let candidates = [
            (self.deltas, ParseSource::Streamed),
            (self.messages.join("\n\n"), ParseSource::Streamed),
            (self.final_message.unwrap_or_default(), ParseSource::Final),
        ];
        for (text, source) in candidates {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return ParsedOutput {
                    text: trimmed.to_string(),
                    source,
                };
            }
        }

        if allow_thinking && !self.thinking.trim().is_empty() {
            return ParsedOutput {
                text: self.thinking.trim().to_string(),
                source: ParseSource::Thinking,
            };
        }

        let plain = self.plain.join("\n");
        if !plain.trim().is_empty() {
            return ParsedOutput {
                text: plain.trim().to_string(),
                source: ParseSource::PlainText,
            };
        }

        ParsedOutput::empty()
    }
}

/// Convert a participant's raw stdout into its intended text answer.
///
/// Never fails: malformed JSON lines are skipped and an empty log yields an
/// empty [`ParseSource::Empty`] result.
pub fn parse_output(participant: Participant, raw: &str) -> ParsedOutput {
    if raw.trim().is_empty() {
        return ParsedOutput::empty();
    }

    let mut fragments = Fragments::default();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(event) if event.is_object() => match participant {
                Participant::Claude => claude::collect(&event, &mut fragments),
                Participant::Codex => codex::collect(&event, &mut fragments),
                Participant::Gemini => gemini::collect(&event, &mut fragments),
            },
            // Scalars and arrays carry no event shape we know about
            Ok(_) => {}
            Err(_) => {
                // Truncated JSON from a killed process is noise, not text
                if !trimmed.starts_with('{') {
                    let cleaned = strip_control_sequences(line);
                    if !cleaned.trim().is_empty() {
                        fragments.plain.push(cleaned);
                    }
                }
            }
        }
    }

    fragments.resolve(participant == Participant::Claude)
}

/// Cheap probe: has the accumulated stdout started carrying answer text?
///
/// Deliberately string matching rather than parsing, since it runs on every
/// chunk. Metadata-only streams (session start, reasoning) do not match.
pub fn has_response_content(participant: Participant, accumulated: &str) -> bool {
    let signatures: &[&str] = match participant {
        Participant::Claude => claude::CONTENT_SIGNATURES,
        Participant::Codex => codex::CONTENT_SIGNATURES,
        Participant::Gemini => gemini::CONTENT_SIGNATURES,
    };
    signatures.iter().any(|sig| accumulated.contains(sig))
}
