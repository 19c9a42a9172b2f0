//! Gemini CLI `stream-json` vocabulary.
//!
//! Assistant text arrives as `message` events with `role: "assistant"`,
//! flagged `delta: true` when incremental. The closing `result` event may
//! carry the whole `response`.

use super::Fragments;
use serde_json::Value;

pub(super) const CONTENT_SIGNATURES: &[&str] = &[r#""role":"assistant""#];

pub(super) fn collect(event: &Value, fragments: &mut Fragments) {
    match event.get("type").and_then(Value::as_str) {
        Some("message") => {
            if event.get("role").and_then(Value::as_str) != Some("assistant") {
                return;
            }
            let Some(content) = event.get("content").and_then(Value::as_str) else {
                return;
            };
            if event.get("delta").and_then(Value::as_bool).unwrap_or(false) {
                fragments.push_delta(content);
            } else {
                fragments.push_message(content);
            }
        }
        Some("result") => {
            if let Some(text) = event.get("response").and_then(Value::as_str) {
                fragments.set_final(text);
            }
        }
        // `--output-format json` prints one object with a top-level response
        None => {
            if let Some(text) = event.get("response").and_then(Value::as_str) {
                fragments.set_final(text);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::core::participant::Participant;
    use crate::parser::{ParseSource, parse_output};

    #[test]
    fn test_assistant_deltas() {
        let raw = [
            r#"{"type":"init","session_id":"g1","model":"gemini-2.5-pro"}"#,
            r#"{"type":"message","role":"user","content":"question"}"#,
            r#"{"type":"message","role":"assistant","content":"I disagree ","delta":true}"#,
            r#"{"type":"message","role":"assistant","content":"with @codex.","delta":true}"#,
            r#"{"type":"result","status":"success","stats":{}}"#,
        ]
        .join("\n");
        let out = parse_output(Participant::Gemini, &raw);
        assert_eq!(out.text, "I disagree with @codex.");
        assert_eq!(out.source, ParseSource::Streamed);
    }

    #[test]
    fn test_single_json_response() {
        let raw = "Loaded cached credentials.\n{\"response\":\"Plain JSON answer\",\"stats\":{}}";
        let out = parse_output(Participant::Gemini, raw);
        assert_eq!(out.text, "Plain JSON answer");
        assert_eq!(out.source, ParseSource::Final);
    }
}
