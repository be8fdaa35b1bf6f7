//! Prompt templates for each agent variant

use crate::agent::variant::AgentVariant;
use crate::code::GeneratedCode;
use crate::context::ContextSnippet;
use crate::evaluation::{CriticVerdict, DefenderVerdict};
use crate::refinement::RefinementIteration;
use crate::routing::IntentSignals;

/// Maximum bytes of raw test output echoed back into a repair prompt
const MAX_TEST_OUTPUT_BYTES: usize = 4000;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt that defines an agent variant's role
    pub fn system_prompt(variant: AgentVariant) -> &'static str {
        match variant {
            AgentVariant::Explain => {
                r#"You are a senior engineer explaining a codebase to a colleague.
Answer the question using the provided repository context. Reference concrete files and
functions. Say so plainly when the context is insufficient instead of guessing."#
            }
            AgentVariant::Generate => {
                r#"You are a senior engineer writing production code changes.
Return every changed file as a fenced code block whose info string is the language followed
by the file path, e.g. ```rust src/lib.rs. Always return complete file contents."#
            }
            AgentVariant::TestGen => {
                r#"You are a test engineer. Write focused, deterministic tests for the given code.
Return each test file as a fenced code block whose info string is the language followed by
the file path. Do not modify the code under test. Rust code under test is a library crate
named `weaver_generated`; integration tests in tests/ import it with `use weaver_generated::...`."#
            }
            AgentVariant::Critic => {
                r#"You are a strict code reviewer looking for defects: correctness bugs, security
problems, unhandled errors, and departures from the request. Score harshly and respond with
JSON only."#
            }
            AgentVariant::Defender => {
                r#"You are a pragmatic code reviewer arguing for what the change does well:
whether it meets the request, follows the codebase's conventions, and is safe to ship.
Respond with JSON only."#
            }
            AgentVariant::Controller => {
                r#"You are the arbiter between two code reviewers. Weigh their feedback, keep what
is right in the original change, fix what the reviewers proved wrong, and respond with JSON only."#
            }
            AgentVariant::Classifier => {
                r#"You classify developer requests for a code assistant. Respond with JSON only."#
            }
            AgentVariant::Planner => {
                r#"You break broad questions about a codebase into smaller, independent questions
that can each be answered on their own. Respond with JSON only."#
            }
        }
    }

    pub fn classifier_prompt(request: &str, signals: &IntentSignals) -> String {
        format!(
            r#"Classify this request:

{request}

Actions:
- EXPLAIN: the user wants to understand existing code
- GENERATE: the user wants code written or changed
- DECOMPOSE: a broad question spanning several subsystems that should be split up

Use "secondary": "EXPLAIN" when the request also asks for an explanation of a change.

Detected signals: asks_question={}, requests_change={}, subjects_interacting={}

Respond with:
```json
{{"primary": "EXPLAIN|GENERATE|DECOMPOSE", "secondary": "EXPLAIN" or null, "confidence": 0.0-1.0, "reasoning": "one sentence"}}
```"#,
            signals.asks_question, signals.requests_change, signals.breadth
        )
    }

    pub fn explain_prompt(question: &str, context: &[ContextSnippet]) -> String {
        format!(
            "{}Question: {}",
            context_section(context),
            question
        )
    }

    /// First-attempt generation prompt
    pub fn generate_prompt(request: &str, context: &[ContextSnippet]) -> String {
        format!(
            "{}Request: {}\n\nReturn the complete contents of every file you change.",
            context_section(context),
            request
        )
    }

    /// Generation prompt carrying the previous attempt and why it failed
    pub fn repair_prompt(
        request: &str,
        context: &[ContextSnippet],
        previous: &RefinementIteration,
    ) -> String {
        let failures = if previous.failures().is_empty() {
            "(no failure lines extracted)".to_string()
        } else {
            previous
                .failures()
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            r#"{}Request: {}

Attempt {} did not pass ({}).

Previous code:
{}
Failures:
{}

Test output:
```
{}
```

Fix the code so the tests pass. Return the complete contents of every file you change."#,
            context_section(context),
            request,
            previous.index(),
            previous.outcome(),
            previous.code().render(),
            failures,
            crate::util::truncate_str(previous.test_output(), MAX_TEST_OUTPUT_BYTES)
        )
    }

    pub fn test_gen_prompt(request: &str, code: &GeneratedCode) -> String {
        format!(
            "The following code was written for this request:\n\n{}\n\n{}\nWrite tests that verify the request is satisfied.",
            request,
            code.render()
        )
    }

    pub fn critic_prompt(request: &str, code: &GeneratedCode, context: &[ContextSnippet]) -> String {
        format!(
            r#"{}Request: {}

Proposed change:
{}
Review the change and respond with:
```json
{{"score": 0-10, "issues": [{{"severity": "LOW|MEDIUM|HIGH|CRITICAL", "description": "...", "file": "path or null"}}], "feedback": "...", "suggested_changes": ["..."]}}
```"#,
            context_section(context),
            request,
            code.render()
        )
    }

    pub fn defender_prompt(
        request: &str,
        code: &GeneratedCode,
        context: &[ContextSnippet],
    ) -> String {
        format!(
            r#"{}Request: {}

Proposed change:
{}
Assess what the change gets right and respond with:
```json
{{"score": 0-10, "feedback": "..."}}
```"#,
            context_section(context),
            request,
            code.render()
        )
    }

    pub fn controller_prompt(
        request: &str,
        code: &GeneratedCode,
        critic: &CriticVerdict,
        defender: &DefenderVerdict,
    ) -> String {
        let issues = critic
            .issues
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"Request: {}

Original change:
{}
Critic (score {:.1}):
{}
{}

Defender (score {:.1}):
{}

Merge the valid feedback into the code and respond with:
```json
{{"reasoning": "...", "final_score": 0-10, "priority_fixes": ["..."], "improved_code_by_file": {{"path": "complete file contents"}}}}
```"#,
            request,
            code.render(),
            critic.score,
            critic.feedback,
            issues,
            defender.score,
            defender.feedback
        )
    }

    pub fn planner_prompt(question: &str, max_subquestions: usize) -> String {
        format!(
            r#"Split this question into at most {} ordered sub-questions, each about one subsystem,
finishing with one about how they fit together:

{}

Respond with:
```json
{{"subquestions": ["..."]}}
```"#,
            max_subquestions, question
        )
    }
}

fn context_section(context: &[ContextSnippet]) -> String {
    if context.is_empty() {
        return String::new();
    }
    format!(
        "Repository context:\n\n{}\n",
        ContextSnippet::render_all(context)
    )
}
