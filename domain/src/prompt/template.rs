//! Prompt templates for each stage of the roundtable

use crate::core::participant::Participant;
use crate::discussion::document::PLAN_SECTIONS;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Planning-mode instructions prepended to the user's question
    pub fn planning_mode() -> &'static str {
        r#"You are taking part in a planning roundtable with other AI coding agents.
Work in planning mode: investigate and reason, but do NOT modify any files,
run destructive commands or commit anything.
Explore the repository as needed, then answer the question below with a
clear, well-structured analysis: relevant context you found, options you see,
and the approach you would recommend."#
    }

    /// Initial question sent to every ready participant
    pub fn initial_question(question: &str, system_prompt: Option<&str>, language: &str) -> String {
        let mut prompt = String::new();
        if let Some(system) = system_prompt.map(str::trim).filter(|s| !s.is_empty()) {
            prompt.push_str(system);
            prompt.push_str("\n\n");
        }
        prompt.push_str(Self::planning_mode());
        prompt.push_str("\n\n");
        prompt.push_str(&Self::language_instruction(language));
        prompt.push_str(&format!("\n\n## Question\n\n{}\n", question.trim()));
        prompt
    }

    /// Independent first-look opinion on the document
    pub fn initial_view(participant: Participant, document: &str, language: &str) -> String {
        format!(
            r#"You are {name} ({mention}) in a roundtable discussion. Below is the shared
discussion document. Give your independent first-look opinion on the topic:
what matters most, what you would do, and what worries you.
Do not try to summarize other participants; state your own view.

{language}

Reply with markdown only. Do not add a top-level heading.

--- DISCUSSION DOCUMENT ---
{document}
--- END OF DOCUMENT ---"#,
            name = participant.display_name(),
            mention = participant.mention(),
            language = Self::language_instruction(language),
            document = document,
        )
    }

    /// Prompt for one speaker's turn in a discussion round
    pub fn discussion_round(
        participant: Participant,
        others: &[Participant],
        round: u32,
        max_rounds: u32,
        document: &str,
        language: &str,
    ) -> String {
        let mentions = others
            .iter()
            .map(Participant::mention)
            .collect::<Vec<_>>()
            .join(", ");

        let focus = if round == 1 {
            format!(
                r#"This is round 1. Read the initial views and engage with them directly.
Disagree openly where you think someone is wrong and say why; agree explicitly
where you are convinced. Address other participants with @mentions
({mentions}) when you respond to a specific point or ask them something."#
            )
        } else {
            format!(
                r#"This is round {round}. First answer every point where you were @mentioned
({me}) in earlier rounds. Then work toward convergence: state which open
disagreements remain, propose resolutions, and drop points that are settled.
Keep using @mentions ({mentions}) when addressing someone."#,
                me = participant.mention(),
            )
        };

        format!(
            r#"You are {name} ({me}) in round {round} of {max_rounds} of a roundtable discussion.

{focus}

{language}

Reply with markdown only. Keep it focused; do not repeat the document back.

--- DISCUSSION DOCUMENT ---
{document}
--- END OF DOCUMENT ---"#,
            name = participant.display_name(),
            me = participant.mention(),
            language = Self::language_instruction(language),
        )
    }

    /// Consensus summary over the whole document
    pub fn consensus(document: &str, language: &str) -> String {
        format!(
            r#"You are the moderator of a finished roundtable discussion. Summarize the
discussion document below into a consensus section:

1. **Agreed points**: what the participants converged on
2. **Remaining disagreements**: positions still in tension and which is better supported
3. **Decision**: the recommended direction in one or two sentences

{language}

Reply with markdown only, without a top-level heading.

--- DISCUSSION DOCUMENT ---
{document}
--- END OF DOCUMENT ---"#,
            language = Self::language_instruction(language),
        )
    }

    /// Standalone execution plan synthesized from the document
    pub fn execution_plan(document: &str, language: &str) -> String {
        let sections = PLAN_SECTIONS
            .iter()
            .map(|s| format!("## {}", s))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"Turn the discussion document below into a standalone execution plan that
someone who never saw the discussion can follow.

Use exactly these sections, in this order:

{sections}

"Implementation Steps" must be a numbered list of concrete steps.
"Verification" says how to check each step worked.
"Risks" lists risks with mitigations.

{language}

Reply with the plan in markdown only.

--- DISCUSSION DOCUMENT ---
{document}
--- END OF DOCUMENT ---"#,
            language = Self::language_instruction(language),
        )
    }

    /// Continuation analysis: should another round run?
    pub fn continuation(document: &str, round: u32, max_rounds: u32) -> String {
        format!(
            r#"You are analyzing a multi-agent discussion after round {round} of at most {max_rounds}.
Decide whether another round would add value. Continue only if there are
unresolved disagreements or unanswered @mentions that another round could settle.

Respond with a single JSON object and nothing else:
{{"shouldContinue": true|false, "reason": "<one sentence>"}}

--- DISCUSSION DOCUMENT ---
{document}
--- END OF DOCUMENT ---"#
        )
    }

    /// Input-gap analysis: does the discussion need facts only the user has?
    pub fn input_gap(document: &str) -> String {
        format!(
            r#"You are analyzing a multi-agent discussion. Decide whether the participants
are blocked on information only the human user can provide (requirements,
constraints, preferences). Do not ask about things the agents can look up.

Respond with a single JSON object and nothing else:
{{"needsInput": true|false, "questions": ["<question>", ...]}}
Ask at most 3 short questions. Use an empty list when no input is needed.

--- DISCUSSION DOCUMENT ---
{document}
--- END OF DOCUMENT ---"#
        )
    }

    /// Background section: the question plus each participant's initial answer
    pub fn background(question: &str, answers: &[(Participant, String)]) -> String {
        let mut background = format!("**Question**\n\n{}\n", question.trim());
        for (participant, answer) in answers {
            background.push_str(&format!(
                "\n### Initial answer from {}\n\n{}\n",
                participant.display_name(),
                demote_for_background(answer.trim())
            ));
        }
        background.trim_end().to_string()
    }

    fn language_instruction(language: &str) -> String {
        format!(
            "Write your response in the language identified by the tag `{}`.",
            language.trim()
        )
    }
}

/// Initial answers land inside the background section, so their own
/// headings must stay below level 3.
fn demote_for_background(text: &str) -> String {
    let mut in_fence = false;
    text.lines()
        .map(|line| {
            let t = line.trim_start();
            if t.starts_with("```") || t.starts_with("~~~") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if !in_fence && line.starts_with('#') {
                let level = line.chars().take_while(|c| *c == '#').count();
                if level < 4 && line[level..].starts_with(' ') {
                    return format!("####{}", &line[level..]);
                }
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
