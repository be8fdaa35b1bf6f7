//! Classifier and planner response parsing.
//!
//! The classifier is asked for a constrained JSON object; anything that does
//! not fit the schema is rejected here so the router can fall back instead
//! of guessing from free text.

use super::action::Action;
use crate::util::extract_json;
use serde::{Deserialize, Serialize};

/// Structured routing judgment returned by the classifier agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierJudgment {
    pub primary: Action,
    pub secondary: Option<Action>,
    pub confidence: f64,
    pub reasoning: String,
}

/// Parse a classifier response.
///
/// Expected schema:
/// ```json
/// {"primary": "EXPLAIN|GENERATE|DECOMPOSE", "secondary": "EXPLAIN|null",
///  "confidence": 0.0-1.0, "reasoning": "..."}
/// ```
///
/// Returns `None` when the primary action is missing, unknown, or REFUSE
/// (refusal is decided by the safety gate, never by the classifier).
/// A missing confidence defaults to 0.5; out-of-range values are clamped.
pub fn parse_classifier_response(response: &str) -> Option<ClassifierJudgment> {
    let json = extract_json(response)?;

    let primary: Action = json.get("primary")?.as_str()?.parse().ok()?;
    if primary == Action::Refuse {
        return None;
    }

    let secondary = json
        .get("secondary")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Action>().ok())
        .filter(|a| *a != Action::Refuse && *a != primary);

    let confidence = json
        .get("confidence")
        .and_then(|v| v.as_f64())
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.5);

    let reasoning = json
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some(ClassifierJudgment {
        primary,
        secondary,
        confidence,
        reasoning,
    })
}

/// Parse the planner's ordered list of sub-questions.
///
/// Accepts `{"subquestions": [...]}`, a bare JSON array, or a numbered /
/// bulleted list. Blank entries are dropped; order is preserved.
pub fn parse_subquestions(response: &str) -> Vec<String> {
    if let Some(json) = extract_json(response) {
        let items = json
            .get("subquestions")
            .or_else(|| json.get("sub_questions"))
            .and_then(|v| v.as_array())
            .or_else(|| json.as_array());
        if let Some(items) = items {
            return items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    response
        .lines()
        .map(str::trim)
        .filter_map(strip_list_marker)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(rest.trim());
        }
    }
    None
}
