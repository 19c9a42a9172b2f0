//! Terminal control sequence stripping for non-JSON output lines.

use regex::Regex;
use std::sync::LazyLock;

/// CSI sequences, OSC sequences (BEL or ST terminated) and two-byte escapes
static ANSI_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("static ANSI pattern is valid")
});

/// Remove ANSI escape sequences and other control characters (tabs kept).
pub fn strip_control_sequences(line: &str) -> String {
    let without_escapes = ANSI_SEQUENCE.replace_all(line, "");
    without_escapes
        .chars()
        .filter(|c| *c == '\t' || !c.is_control())
        .collect()
}
