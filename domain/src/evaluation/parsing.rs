//! Reviewer and controller response parsing.
//!
//! Each reviewer is asked for a JSON object. Anything without a numeric
//! score is rejected so the caller can treat the reviewer as unavailable,
//! rather than guessing a score from prose.

use super::issue::{IssueSeverity, ReviewIssue};
use super::verdict::{CriticVerdict, DefenderVerdict};
use crate::util::extract_json;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse a CRITIC response.
///
/// ```json
/// {"score": 6, "issues": [{"severity": "HIGH", "description": "...", "file": "src/a.rs"}],
///  "feedback": "...", "suggested_changes": ["..."]}
/// ```
///
/// Issues with an unknown severity are kept as MEDIUM.
pub fn parse_critic_response(response: &str) -> Option<CriticVerdict> {
    let json = extract_json(response)?;
    let score = score_of(&json)?;

    let issues = json
        .get("issues")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_issue).collect())
        .unwrap_or_default();

    Some(
        CriticVerdict::new(score, issues, string_field(&json, "feedback"))
            .with_suggested_changes(string_list(&json, "suggested_changes")),
    )
}

/// Parse a DEFENDER response: `{"score": 8, "feedback": "..."}`.
pub fn parse_defender_response(response: &str) -> Option<DefenderVerdict> {
    let json = extract_json(response)?;
    let score = score_of(&json)?;
    Some(DefenderVerdict::new(score, string_field(&json, "feedback")))
}

/// What the CONTROLLER agent proposes for a MERGE_FEEDBACK decision
#[derive(Debug, Clone, PartialEq)]
pub struct MergeProposal {
    pub reasoning: String,
    pub final_score: Option<f64>,
    pub priority_fixes: Vec<String>,
    pub improved_code_by_file: BTreeMap<String, String>,
}

/// Parse a CONTROLLER response.
///
/// ```json
/// {"reasoning": "...", "final_score": 7.5, "priority_fixes": ["..."],
///  "improved_code_by_file": {"src/a.rs": "..."}}
/// ```
///
/// Returns `None` when the response carries no improved code map.
pub fn parse_controller_response(response: &str) -> Option<MergeProposal> {
    let json = extract_json(response)?;
    let improved = json
        .get("improved_code_by_file")
        .or_else(|| json.get("improved_code"))
        .and_then(Value::as_object)?;

    let improved_code_by_file = improved
        .iter()
        .filter_map(|(path, code)| Some((path.clone(), code.as_str()?.to_string())))
        .collect();

    Some(MergeProposal {
        reasoning: string_field(&json, "reasoning"),
        final_score: json.get("final_score").and_then(Value::as_f64),
        priority_fixes: string_list(&json, "priority_fixes"),
        improved_code_by_file,
    })
}

fn score_of(json: &Value) -> Option<f64> {
    let score = json.get("score")?;
    score
        .as_f64()
        .or_else(|| score.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|s| s.is_finite())
}

fn parse_issue(value: &Value) -> Option<ReviewIssue> {
    if let Some(text) = value.as_str() {
        return Some(ReviewIssue::new(IssueSeverity::Medium, text));
    }
    let description = value.get("description").and_then(Value::as_str)?;
    let severity = value
        .get("severity")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(IssueSeverity::Medium);
    let issue = ReviewIssue::new(severity, description);
    Some(match value.get("file").and_then(Value::as_str) {
        Some(file) => issue.with_file(file),
        None => issue,
    })
}

fn string_field(json: &Value, key: &str) -> String {
    json.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(json: &Value, key: &str) -> Vec<String> {
    json.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
