//! Claude CLI `stream-json` vocabulary.
//!
//! ```text
//! system → stream_event* → assistant* → result
//! ```
//!
//! `stream_event` only appears with partial messages enabled and wraps raw
//! API events (`content_block_delta` with `text_delta` / `thinking_delta`).
//! `assistant` events carry complete content blocks, `result` the final text.

use super::Fragments;
use serde_json::Value;

pub(super) const CONTENT_SIGNATURES: &[&str] = &[r#""type":"text""#, r#""text_delta""#];

pub(super) fn collect(event: &Value, fragments: &mut Fragments) {
    match event.get("type").and_then(Value::as_str) {
        Some("stream_event") => {
            let Some(inner) = event.get("event") else {
                return;
            };
            if inner.get("type").and_then(Value::as_str) != Some("content_block_delta") {
                return;
            }
            let Some(delta) = inner.get("delta") else {
                return;
            };
            match delta.get("type").and_then(Value::as_str) {
                Some("text_delta") => {
                    if let Some(text) = delta.get("text").and_then(Value::as_str) {
                        fragments.push_delta(text);
                    }
                }
                Some("thinking_delta") => {
                    if let Some(text) = delta.get("thinking").and_then(Value::as_str) {
                        fragments.push_thinking(text);
                    }
                }
                _ => {}
            }
        }
        Some("assistant") => {
            let Some(content) = event.get("message").and_then(|m| m.get("content")) else {
                return;
            };
            if let Some(text) = content.as_str() {
                fragments.push_message(text);
                return;
            }
            for block in content.as_array().into_iter().flatten() {
                match block.get("type").and_then(Value::as_str) {
                    Some("text") => {
                        if let Some(text) = block.get("text").and_then(Value::as_str) {
                            fragments.push_message(text);
                        }
                    }
                    Some("thinking") => {
                        if let Some(text) = block.get("thinking").and_then(Value::as_str) {
                            fragments.push_thinking(text);
                        }
                    }
                    _ => {}
                }
            }
        }
        Some("result") => {
            if let Some(text) = event.get("result").and_then(Value::as_str) {
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
    fn test_deltas_preferred_over_assistant_and_result() {
        let raw = [
            r#"{"type":"system","subtype":"init","session_id":"s1"}"#,
            r#"{"type":"stream_event","event":{"type":"content_block_delta","delta":{"type":"text_delta","text":"Use "}}}"#,
            r#"{"type":"stream_event","event":{"type":"content_block_delta","delta":{"type":"text_delta","text":"consistent hashing."}}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Use consistent hashing."}]}}"#,
            r#"{"type":"result","subtype":"success","result":"Use consistent hashing."}"#,
        ]
        .join("\n");
        let out = parse_output(Participant::Claude, &raw);
        assert_eq!(out.text, "Use consistent hashing.");
        assert_eq!(out.source, ParseSource::Streamed);
    }

    #[test]
    fn test_assistant_blocks_joined_in_order() {
        let raw = [
            r#"{"type":"assistant","message":{"content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"First point."}]}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read"}]}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Second point."}]}}"#,
        ]
        .join("\n");
        let out = parse_output(Participant::Claude, &raw);
        assert_eq!(out.text, "First point.\n\nSecond point.");
    }

    #[test]
    fn test_result_used_when_no_streamed_text() {
        let raw = r#"{"type":"result","subtype":"success","result":"  Final answer  "}"#;
        let out = parse_output(Participant::Claude, raw);
        assert_eq!(out.text, "Final answer");
        assert_eq!(out.source, ParseSource::Final);
    }

    #[test]
    fn test_thinking_only_log_returns_thinking() {
        let raw = [
            r#"{"type":"system","subtype":"init"}"#,
            r#"{"type":"stream_event","event":{"type":"content_block_delta","delta":{"type":"thinking_delta","thinking":"The user wants "}}}"#,
            r#"{"type":"stream_event","event":{"type":"content_block_delta","delta":{"type":"thinking_delta","thinking":"a sharding plan."}}}"#,
        ]
        .join("\n");
        let out = parse_output(Participant::Claude, &raw);
        assert_eq!(out.text, "The user wants a sharding plan.");
        assert!(out.is_thinking_fallback());
    }

    #[test]
    fn test_thinking_blocks_in_assistant_messages() {
        let raw = r#"{"type":"assistant","message":{"content":[{"type":"thinking","thinking":"Considering trade-offs"}]}}"#;
        let out = parse_output(Participant::Claude, raw);
        assert_eq!(out.source, ParseSource::Thinking);
        assert_eq!(out.text, "Considering trade-offs");
    }
}
