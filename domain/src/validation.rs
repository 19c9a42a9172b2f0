//! Output validation: sanity checks on a participant's clean text.
//!
//! Validation is advisory. The orchestrator treats any issue as a failed
//! turn, but nothing here has side effects.

use serde::{Deserialize, Serialize};

/// Texts shorter than this (in characters, after trimming) are suspect
pub const MIN_OUTPUT_CHARS: usize = 20;

/// Minimum fraction of text-like characters
pub const MIN_TEXT_RATIO: f64 = 0.5;

/// Why a clean text was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    Empty,
    TooShort { chars: usize },
    NonText { text_ratio: f64 },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::Empty => write!(f, "empty output"),
            ValidationIssue::TooShort { chars } => {
                write!(f, "suspiciously short ({} characters)", chars)
            }
            ValidationIssue::NonText { text_ratio } => write!(
                f,
                "high ratio of non-text characters ({:.0}% text-like)",
                text_ratio * 100.0
            ),
        }
    }
}

/// Letter ranges that count as text for the discussion language.
///
/// Latin letters are always accepted, since code identifiers and product
/// names show up in every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptProfile {
    cjk: bool,
    hangul: bool,
    cyrillic: bool,
}

impl ScriptProfile {
    /// Build a profile from a BCP-47 style language tag (`en`, `zh-CN`, ...)
    pub fn from_language(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "zh" => Self {
                cjk: true,
                ..Self::default()
            },
            "ja" => Self {
                cjk: true,
                ..Self::default()
            },
            "ko" => Self {
                hangul: true,
                cjk: true,
                ..Self::default()
            },
            "ru" | "uk" | "bg" | "sr" => Self {
                cyrillic: true,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    fn is_letter(&self, c: char) -> bool {
        let cp = c as u32;
        if c.is_ascii_alphabetic() || (0x00C0..=0x024F).contains(&cp) {
            return true;
        }
        if self.cjk
            && ((0x4E00..=0x9FFF).contains(&cp)
                || (0x3400..=0x4DBF).contains(&cp)
                || (0x3040..=0x30FF).contains(&cp))
        {
            return true;
        }
        if self.hangul && ((0xAC00..=0xD7AF).contains(&cp) || (0x1100..=0x11FF).contains(&cp)) {
            return true;
        }
        self.cyrillic && (0x0400..=0x04FF).contains(&cp)
    }

    fn is_text_like(&self, c: char) -> bool {
        if c.is_whitespace() || c.is_ascii_digit() || c.is_ascii_punctuation() {
            return true;
        }
        let cp = c as u32;
        // General punctuation, CJK punctuation, fullwidth forms, arrows and box drawing
        (0x2000..=0x206F).contains(&cp)
            || (0x3000..=0x303F).contains(&cp)
            || (0xFF00..=0xFFEF).contains(&cp)
            || (0x2190..=0x21FF).contains(&cp)
            || (0x2500..=0x257F).contains(&cp)
            || self.is_letter(c)
    }
}

/// Check a clean text for emptiness, shortness and binary garbage.
pub fn validate_output(text: &str, profile: &ScriptProfile) -> Option<ValidationIssue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(ValidationIssue::Empty);
    }

    let total = trimmed.chars().count();
    if total < MIN_OUTPUT_CHARS {
        return Some(ValidationIssue::TooShort { chars: total });
    }

    let text_like = trimmed.chars().filter(|c| profile.is_text_like(*c)).count();
    let text_ratio = text_like as f64 / total as f64;
    if text_ratio < MIN_TEXT_RATIO {
        return Some(ValidationIssue::NonText { text_ratio });
    }

    None
}
