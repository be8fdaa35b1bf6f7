//! Lexical intent signals extracted from request text.
//!
//! These are cheap, deterministic hints. They feed the classifier prompt and
//! enforce the dual-intent rule (question + change request → GENERATE with
//! EXPLAIN alongside).

use serde::{Deserialize, Serialize};

const QUESTION_OPENERS: &[&str] = &[
    "how", "what", "why", "where", "when", "which", "who", "does", "do", "is", "are", "explain",
    "describe", "walk", "tell",
];

const CHANGE_VERBS: &[&str] = &[
    "add",
    "implement",
    "write",
    "create",
    "fix",
    "refactor",
    "change",
    "modify",
    "update",
    "remove",
    "delete",
    "rename",
    "generate",
    "build",
    "convert",
    "migrate",
    "optimize",
    "replace",
    "extract",
    "introduce",
];

const FILLERS: &[&str] = &[
    "please", "also", "then", "and", "so", "now", "can", "could", "would", "will", "you", "pls",
];

const INTERACTION_MARKERS: &[&str] = &[
    "interact",
    "work together",
    "fit together",
    "relate to each other",
    "relationship between",
    "talk to each other",
];

/// Signals detected in a query's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntentSignals {
    /// The text asks an explanatory question
    pub asks_question: bool,
    /// The text contains an imperative code-change verb
    pub requests_change: bool,
    /// Number of distinct subjects in a "how do X, Y and Z interact" question
    pub breadth: usize,
}

impl IntentSignals {
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        let clauses = split_clauses(&lower);

        let asks_question = lower.trim_end().ends_with('?')
            || clauses
                .iter()
                .any(|c| first_word(c).is_some_and(|w| QUESTION_OPENERS.contains(&w)));

        let requests_change = clauses
            .iter()
            .any(|c| leading_verb(c).is_some_and(|w| CHANGE_VERBS.contains(&w)));

        Self {
            asks_question,
            requests_change,
            breadth: breadth(&lower),
        }
    }

    /// Both an explanatory question and a code-change request
    pub fn is_dual_intent(&self) -> bool {
        self.asks_question && self.requests_change
    }

    /// Spans enough subjects to warrant decomposition
    pub fn is_broad(&self) -> bool {
        self.breadth >= 3
    }
}

fn split_clauses(text: &str) -> Vec<&str> {
    text.split(['.', '?', '!', ';', '\n'])
        .flat_map(|sentence| sentence.split(" and "))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

fn words(clause: &str) -> impl Iterator<Item = &str> {
    clause
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

fn first_word(clause: &str) -> Option<&str> {
    words(clause).next()
}

/// First word after polite fillers ("please", "can you", "then" ...)
fn leading_verb(clause: &str) -> Option<&str> {
    words(clause).find(|w| !FILLERS.contains(w))
}

fn breadth(text: &str) -> usize {
    let Some(marker_at) = INTERACTION_MARKERS
        .iter()
        .filter_map(|m| text.find(m))
        .min()
    else {
        return 0;
    };

    let subject = &text[..marker_at];
    let subject = subject
        .rsplit_once(" do ")
        .or_else(|| subject.rsplit_once(" does "))
        .or_else(|| subject.rsplit_once(" between "))
        .map(|(_, rest)| rest)
        .unwrap_or(subject);

    subject
        .split([',', '/'])
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "and")
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_question() {
        let signals = IntentSignals::detect("How does the database connection work?");
        assert!(signals.asks_question);
        assert!(!signals.requests_change);
        assert!(!signals.is_dual_intent());
        assert!(!signals.is_broad());
    }

    #[test]
    fn test_plain_change() {
        let signals = IntentSignals::detect("Add retry logic to the HTTP client");
        assert!(!signals.asks_question);
        assert!(signals.requests_change);
    }

    #[test]
    fn test_polite_change() {
        let signals = IntentSignals::detect("Could you please refactor the parser");
        assert!(signals.requests_change);
    }

    #[test]
    fn test_dual_intent() {
        let signals =
            IntentSignals::detect("How does caching work here? Also add an eviction metric.");
        assert!(signals.is_dual_intent());

        let same_sentence = IntentSignals::detect("Explain the retry loop and fix the off-by-one");
        assert!(same_sentence.is_dual_intent());
    }

    #[test]
    fn test_breadth() {
        let signals =
            IntentSignals::detect("How do the router, the scheduler, and the evaluator interact?");
        assert_eq!(signals.breadth, 3);
        assert!(signals.is_broad());

        let narrow = IntentSignals::detect("How do the router and the scheduler interact?");
        assert_eq!(narrow.breadth, 2);
        assert!(!narrow.is_broad());
    }

    #[test]
    fn test_no_interaction_marker() {
        assert_eq!(IntentSignals::detect("What is a, b, c?").breadth, 0);
    }
}
