//! Continuation and input-gap analysis responses.
//!
//! Both analyses are advisory. Any response that cannot be read as the
//! expected JSON object resolves to the conservative default: stop
//! iterating, and do not ask the user anything.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default reason when the continuation call fails
pub const ANALYSIS_FAILED_REASON: &str = "analysis failed, stopping";

/// Gap analysis never asks more than this many questions
pub const MAX_GAP_QUESTIONS: usize = 3;

/// Marker inserted where a long document was cut
pub const TRUNCATION_MARKER: &str = "\n\n[... document truncated ...]\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationDecision {
    pub should_continue: bool,
    pub reason: String,
}

impl ContinuationDecision {
    pub fn stop(reason: impl Into<String>) -> Self {
        Self {
            should_continue: false,
            reason: reason.into(),
        }
    }

    pub fn analysis_failed() -> Self {
        Self::stop(ANALYSIS_FAILED_REASON)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputGap {
    pub needs_input: bool,
    pub questions: Vec<String>,
}

impl InputGap {
    pub fn none() -> Self {
        Self::default()
    }

    /// True when the workflow should pause for answers
    pub fn requires_pause(&self) -> bool {
        self.needs_input && !self.questions.is_empty()
    }
}

/// Slice out the JSON object in a response: first `{` to last `}`.
///
/// Tolerates code fences and prose around the object.
pub fn extract_json_object(response: &str) -> Option<Value> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&response[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn read_bool(object: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .find_map(|k| object.get(*k))
        .and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        })
}

/// Parse a continuation response. Malformed input yields the stop default.
///
/// # Examples
///
/// ```
/// use roundtable_domain::analysis::parse_continuation;
///
/// let d = parse_continuation(r#"{"shouldContinue": true, "reason": "open questions"}"#);
/// assert!(d.should_continue);
/// assert!(!parse_continuation("no json here").should_continue);
/// ```
pub fn parse_continuation(response: &str) -> ContinuationDecision {
    let Some(object) = extract_json_object(response) else {
        return ContinuationDecision::analysis_failed();
    };
    let Some(should_continue) = read_bool(&object, &["shouldContinue", "should_continue"]) else {
        return ContinuationDecision::analysis_failed();
    };
    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(if should_continue {
            "continuing"
        } else {
            "discussion converged"
        })
        .to_string();
    ContinuationDecision {
        should_continue,
        reason,
    }
}

/// Parse a gap-analysis response. Malformed input yields "no input needed".
pub fn parse_input_gap(response: &str) -> InputGap {
    let Some(object) = extract_json_object(response) else {
        return InputGap::none();
    };
    let Some(needs_input) = read_bool(&object, &["needsInput", "needs_input"]) else {
        return InputGap::none();
    };
    if !needs_input {
        return InputGap::none();
    }

    let questions: Vec<String> = object
        .get("questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .take(MAX_GAP_QUESTIONS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    InputGap {
        needs_input: !questions.is_empty(),
        questions,
    }
}

/// Cap `document` at `max_chars` characters, keeping the head and the tail.
///
/// The tail holds the latest rounds, so it gets the larger share.
pub fn truncate_document(document: &str, max_chars: usize) -> String {
    let total = document.chars().count();
    if total <= max_chars {
        return document.to_string();
    }
    let head_chars = max_chars / 3;
    let tail_chars = max_chars - head_chars;
    let head: String = document.chars().take(head_chars).collect();
    let tail: String = document.chars().skip(total - tail_chars).collect();
    format!("{}{}{}", head, TRUNCATION_MARKER, tail)
}
