//! Discussion document section algebra.
//!
//! The document is markdown with five `## ` section headings in fixed order.
//! Appends insert content right before the heading that follows the target
//! section, so within-section order is call order and section order never
//! changes. Everything here is pure string manipulation; reading and writing
//! the file is the store adapter's job.
//!
//! Headings inside fenced code blocks are ignored when scanning, and level-1
//! and level-2 headings inside appended content are demoted to level 3, so
//! agent output cannot introduce a fake section boundary. A fence left open
//! by the content (a truncated reply) is closed at the end of the entry, or
//! every later marker would be read as code.

use serde::{Deserialize, Serialize};

/// Appends shorter than this (in characters, after trimming) are noise
pub const MIN_APPEND_CHARS: usize = 20;

/// The five ordered document sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Background,
    InitialViews,
    DiscussionRounds,
    ConsensusSummary,
    ExecutionPlan,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Background,
        Section::InitialViews,
        Section::DiscussionRounds,
        Section::ConsensusSummary,
        Section::ExecutionPlan,
    ];

    /// Heading line that marks the start of this section
    pub fn marker(&self) -> &'static str {
        match self {
            Section::Background => "## Topic & Background",
            Section::InitialViews => "## Initial Expert Views",
            Section::DiscussionRounds => "## Discussion Rounds",
            Section::ConsensusSummary => "## Consensus Summary",
            Section::ExecutionPlan => "## Execution Plan",
        }
    }
}

/// Built-in document template
pub const DEFAULT_TEMPLATE: &str = "# Roundtable: {{topic}}

- **Date**: {{date}}
- **Participants**: {{participants}}

## Topic & Background

{{background}}

## Initial Expert Views

## Discussion Rounds

## Consensus Summary

## Execution Plan
";

/// Subsections a generated execution plan must contain
pub const PLAN_SECTIONS: [&str; 5] = [
    "Context",
    "Recommended Approach",
    "Implementation Steps",
    "Verification",
    "Risks",
];

/// Result of composing an append against the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// New full document content
    Inserted(String),
    /// Content was too short to be worth recording
    Skipped { chars: usize },
}

/// Fill `{{name}}` placeholders. Unknown placeholders are left in place.
pub fn render_template(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in substitutions {
        rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
    }
    rendered
}

/// Placeholders still present after rendering
pub fn unresolved_placeholders(rendered: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = rendered;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            found.push(name.to_string());
        }
        rest = &after[end + 2..];
    }
    found
}

/// Sections whose marker is absent from the document
pub fn missing_sections(document: &str) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|s| find_marker(document, s.marker()).is_none())
        .collect()
}

/// Plan subsections that do not appear as a heading in `plan`
pub fn missing_plan_sections(plan: &str) -> Vec<&'static str> {
    let headings: Vec<String> = plan
        .lines()
        .filter(|l| l.trim_start().starts_with('#'))
        .map(|l| l.to_lowercase())
        .collect();
    PLAN_SECTIONS
        .into_iter()
        .filter(|name| {
            let needle = name.to_lowercase();
            !headings.iter().any(|h| h.contains(&needle))
        })
        .collect()
}

/// Build the block for one append: heading plus demoted content, or the
/// content verbatim when it already opens with a heading.
pub fn compose_entry(heading: &str, content: &str) -> String {
    let (mut body, open_fence) = demote_headings(content.trim());
    if let Some(fence) = open_fence {
        body.push('\n');
        body.push_str(fence);
    }
    if starts_with_entry_heading(&body) {
        body
    } else {
        format!("### {}\n\n{}", heading.trim(), body)
    }
}

/// Insert `content` (with `heading`) at the end of the section marked by
/// `section_marker`.
///
/// Marker absent: the block goes to end of file. Marker present: the block
/// goes immediately before the next `## ` heading, or end of file when the
/// section is last.
pub fn append_to_section(
    document: &str,
    section_marker: &str,
    heading: &str,
    content: &str,
) -> AppendOutcome {
    let chars = content.trim().chars().count();
    if chars < MIN_APPEND_CHARS {
        return AppendOutcome::Skipped { chars };
    }

    let block = compose_entry(heading, content);
    let at = match find_marker(document, section_marker) {
        Some(marker_line_end) => next_section_start(document, marker_line_end),
        None => document.len(),
    };
    AppendOutcome::Inserted(insert_block(document, at, &block))
}

/// Format answered clarification questions as markdown
pub fn format_clarifications(questions: &[String], answers: &[(usize, String)]) -> String {
    let mut out = String::new();
    for (i, question) in questions.iter().enumerate() {
        let answer = answers
            .iter()
            .find(|(idx, _)| *idx == i)
            .map(|(_, a)| a.trim())
            .filter(|a| !a.is_empty())
            .unwrap_or("_(no answer provided)_");
        out.push_str(&format!("**Q{}.** {}\n\n**A{}.** {}\n\n", i + 1, question.trim(), i + 1, answer));
    }
    out.trim_end().to_string()
}

fn starts_with_entry_heading(body: &str) -> bool {
    body.starts_with("### ")
}

fn is_fence(line: &str) -> bool {
    fence_kind(line).is_some()
}

fn fence_kind(line: &str) -> Option<&'static str> {
    let t = line.trim_start();
    if t.starts_with("```") {
        Some("```")
    } else if t.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn is_section_heading(line: &str) -> bool {
    line.starts_with("## ")
}

/// Lines with their starting byte offsets, excluding lines inside fences
fn lines_outside_fences(document: &str) -> Vec<(usize, &str)> {
    let mut result = Vec::new();
    let mut offset = 0;
    let mut in_fence = false;
    for line in document.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            result.push((start, line.trim_end_matches(['\n', '\r'])));
        }
    }
    result
}

/// Byte offset just past the marker line
fn find_marker(document: &str, marker: &str) -> Option<usize> {
    lines_outside_fences(document)
        .into_iter()
        .find(|(_, line)| line.starts_with(marker))
        .map(|(start, line)| {
            let end = start + line.len();
            // Include the line terminator if present
            document[end..]
                .find('\n')
                .map(|nl| end + nl + 1)
                .unwrap_or(document.len())
        })
}

fn next_section_start(document: &str, from: usize) -> usize {
    lines_outside_fences(document)
        .into_iter()
        .find(|(start, line)| *start >= from && is_section_heading(line))
        .map(|(start, _)| start)
        .unwrap_or(document.len())
}

fn insert_block(document: &str, at: usize, block: &str) -> String {
    let (head, tail) = document.split_at(at);
    let head = head.trim_end();
    let mut out = String::with_capacity(document.len() + block.len() + 4);
    if !head.is_empty() {
        out.push_str(head);
        out.push_str("\n\n");
    }
    out.push_str(block.trim());
    if tail.trim().is_empty() {
        out.push('\n');
    } else {
        out.push_str("\n\n");
        out.push_str(tail);
    }
    out
}

/// Demoted content, plus the fence still open at its end
fn demote_headings(content: &str) -> (String, Option<&'static str>) {
    let mut open_fence = None;
    let mut out = String::with_capacity(content.len() + 8);
    for line in content.split_inclusive('\n') {
        if let Some(kind) = fence_kind(line) {
            open_fence = match open_fence {
                Some(_) => None,
                None => Some(kind),
            };
            out.push_str(line);
            continue;
        }
        if open_fence.is_none() {
            if let Some(rest) = line.strip_prefix("# ") {
                out.push_str("### ");
                out.push_str(rest);
                continue;
            }
            if let Some(rest) = line.strip_prefix("## ") {
                out.push_str("### ");
                out.push_str(rest);
                continue;
            }
        }
        out.push_str(line);
    }
    (out, open_fence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_document() -> String {
        render_template(
            DEFAULT_TEMPLATE,
            &[
                ("topic", "Cache sharding"),
                ("date", "2026-01-01"),
                ("participants", "claude, codex"),
                ("background", "We run a single Redis node."),
            ],
        )
    }

    fn inserted(outcome: AppendOutcome) -> String {
        match outcome {
            AppendOutcome::Inserted(doc) => doc,
            AppendOutcome::Skipped { chars } => panic!("unexpected skip ({} chars)", chars),
        }
    }

    fn position(doc: &str, needle: &str) -> usize {
        doc.find(needle)
            .unwrap_or_else(|| panic!("missing {:?} in:\n{}", needle, doc))
    }

    #[test]
    fn test_render_template_fills_placeholders() {
        let doc = fresh_document();
        assert!(doc.starts_with("# Roundtable: Cache sharding"));
        assert!(doc.contains("We run a single Redis node."));
        assert!(unresolved_placeholders(&doc).is_empty());
        assert!(missing_sections(&doc).is_empty());
    }

    #[test]
    fn test_unresolved_placeholders_reported() {
        let doc = render_template("{{topic}} {{owner}} {{ not a key }}", &[("topic", "x")]);
        assert_eq!(unresolved_placeholders(&doc), vec!["owner".to_string()]);
    }

    #[test]
    fn test_short_content_skipped() {
        let outcome = append_to_section(&fresh_document(), Section::InitialViews.marker(), "x", "too short");
        assert_eq!(outcome, AppendOutcome::Skipped { chars: 9 });
    }

    #[test]
    fn test_appends_preserve_section_and_call_order() {
        let mut doc = fresh_document();
        let appends = [
            (Section::DiscussionRounds, "Round 1 - claude", "claude round one argument text"),
            (Section::InitialViews, "claude", "claude initial view on sharding"),
            (Section::DiscussionRounds, "Round 1 - codex", "codex round one argument text"),
            (Section::InitialViews, "codex", "codex initial view on sharding"),
            (Section::ExecutionPlan, "Plan", "numbered steps for the plan go here"),
            (Section::ConsensusSummary, "Consensus", "everyone agrees on consistent hashing"),
            (Section::DiscussionRounds, "Round 2 - codex", "codex round two argument text"),
        ];
        for (section, heading, content) in appends {
            doc = inserted(append_to_section(&doc, section.marker(), heading, content));
        }

        let order = [
            Section::Background.marker(),
            Section::InitialViews.marker(),
            "claude initial view",
            "codex initial view",
            Section::DiscussionRounds.marker(),
            "claude round one",
            "codex round one",
            "codex round two",
            Section::ConsensusSummary.marker(),
            "everyone agrees",
            Section::ExecutionPlan.marker(),
            "numbered steps",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&doc, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", doc);
        assert!(doc.ends_with("numbered steps for the plan go here\n"));
    }

    #[test]
    fn test_missing_marker_appends_at_end() {
        let doc = "# Notes\n\nsome text\n";
        let out = inserted(append_to_section(doc, "## Nowhere", "Heading", "content long enough to keep"));
        assert_eq!(
            out,
            "# Notes\n\nsome text\n\n### Heading\n\ncontent long enough to keep\n"
        );
    }

    #[test]
    fn test_verbatim_heading_and_demotion() {
        let doc = fresh_document();
        let out = inserted(append_to_section(
            &doc,
            Section::InitialViews.marker(),
            "ignored",
            "## My View\n\nThe cache should be sharded.\n# Another Top Heading\n",
        ));
        assert!(out.contains("### My View\n\nThe cache should be sharded.\n### Another Top Heading"));
        assert!(!out.contains("### ignored"));
        assert!(missing_sections(&out).is_empty());
        // Sections still in order after the demoted content
        assert!(position(&out, "### Another Top Heading") < position(&out, Section::DiscussionRounds.marker()));
    }

    #[test]
    fn test_fenced_headings_do_not_split_sections() {
        let doc = fresh_document();
        let content = "Example config:\n```bash\n## not a heading\necho hi\n```\nend of view";
        let doc = inserted(append_to_section(&doc, Section::InitialViews.marker(), "claude", content));
        assert!(doc.contains("## not a heading"));
        let doc = inserted(append_to_section(&doc, Section::InitialViews.marker(), "codex", "codex view comes after claude"));
        assert!(position(&doc, "end of view") < position(&doc, "codex view comes after"));
        assert!(position(&doc, "codex view comes after") < position(&doc, Section::DiscussionRounds.marker()));
    }

    #[test]
    fn test_unterminated_fence_is_closed() {
        let truncated = "Here is the config:\n```yaml\nshards: 4\n";
        assert!(compose_entry("Claude", truncated).ends_with("shards: 4\n```"));

        let mut doc = fresh_document();
        doc = inserted(append_to_section(&doc, Section::InitialViews.marker(), "Claude", truncated));
        doc = inserted(append_to_section(&doc, Section::InitialViews.marker(), "Codex", "codex view lands in its section"));
        doc = inserted(append_to_section(&doc, Section::DiscussionRounds.marker(), "Round 1 - Codex", "round one text from codex"));
        doc = inserted(append_to_section(&doc, Section::ConsensusSummary.marker(), "Consensus", "agreement on four shards"));

        let order = [
            "shards: 4",
            "codex view lands",
            Section::DiscussionRounds.marker(),
            "round one text",
            Section::ConsensusSummary.marker(),
            "agreement on four",
            Section::ExecutionPlan.marker(),
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&doc, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", doc);
        assert!(missing_sections(&doc).is_empty());
    }

    #[test]
    fn test_missing_plan_sections() {
        let plan = "## Context\n...\n## Recommended Approach\n...\n### Implementation Steps\n1. a\n## Risks\n";
        assert_eq!(missing_plan_sections(plan), vec!["Verification"]);
    }

    #[test]
    fn test_format_clarifications() {
        let questions = vec!["Which region first?".to_string(), "Budget?".to_string()];
        let text = format_clarifications(&questions, &[(0, "eu-west".to_string())]);
        assert!(text.contains("**Q1.** Which region first?\n\n**A1.** eu-west"));
        assert!(text.contains("**A2.** _(no answer provided)_"));
    }
}
