//! Codex CLI `exec --json` vocabulary.
//!
//! Current releases emit item lifecycle events
//! (`{"type":"item.completed","item":{"type":"agent_message","text":..}}`);
//! older ones wrap protocol messages in `msg` (`agent_message_delta`,
//! `agent_message`, `task_complete`). Both are accepted.

use super::Fragments;
use serde_json::Value;

pub(super) const CONTENT_SIGNATURES: &[&str] = &[r#""agent_message"#];

pub(super) fn collect(event: &Value, fragments: &mut Fragments) {
    if event.get("type").and_then(Value::as_str) == Some("item.completed") {
        if let Some(item) = event.get("item")
            && item.get("type").and_then(Value::as_str) == Some("agent_message")
            && let Some(text) = item.get("text").and_then(Value::as_str)
        {
            fragments.push_message(text);
        }
        return;
    }

    let Some(msg) = event.get("msg") else {
        return;
    };
    match msg.get("type").and_then(Value::as_str) {
        Some("agent_message_delta") => {
            if let Some(delta) = msg.get("delta").and_then(Value::as_str) {
                fragments.push_delta(delta);
            }
        }
        Some("agent_message") => {
            if let Some(text) = msg.get("message").and_then(Value::as_str) {
                fragments.push_message(text);
            }
        }
        Some("task_complete") => {
            if let Some(text) = msg.get("last_agent_message").and_then(Value::as_str) {
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
    fn test_item_completed_agent_messages() {
        let raw = [
            r#"{"type":"thread.started","thread_id":"t1"}"#,
            r#"{"type":"item.completed","item":{"id":"i0","type":"reasoning","text":"thinking"}}"#,
            r#"{"type":"item.completed","item":{"id":"i1","type":"agent_message","text":"Split the cache by tenant."}}"#,
            r#"{"type":"turn.completed","usage":{"input_tokens":10}}"#,
        ]
        .join("\n");
        let out = parse_output(Participant::Codex, &raw);
        assert_eq!(out.text, "Split the cache by tenant.");
        assert_eq!(out.source, ParseSource::Streamed);
    }

    #[test]
    fn test_legacy_deltas_joined() {
        let raw = [
            r#"{"id":"0","msg":{"type":"agent_message_delta","delta":"Agreed with "}}"#,
            r#"{"id":"0","msg":{"type":"agent_message_delta","delta":"@claude."}}"#,
            r#"{"id":"0","msg":{"type":"agent_message","message":"Agreed with @claude."}}"#,
        ]
        .join("\n");
        let out = parse_output(Participant::Codex, &raw);
        assert_eq!(out.text, "Agreed with @claude.");
    }

    #[test]
    fn test_task_complete_fallback() {
        let raw = r#"{"id":"0","msg":{"type":"task_complete","last_agent_message":"Done: use Redis."}}"#;
        let out = parse_output(Participant::Codex, raw);
        assert_eq!(out.text, "Done: use Redis.");
        assert_eq!(out.source, ParseSource::Final);
    }
}
