//! Route actions and agent slots

use serde::{Deserialize, Serialize};

/// What the pipeline should do with a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Explain,
    Generate,
    Refuse,
    Decompose,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Explain => "EXPLAIN",
            Action::Generate => "GENERATE",
            Action::Refuse => "REFUSE",
            Action::Decompose => "DECOMPOSE",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EXPLAIN" => Ok(Action::Explain),
            "GENERATE" => Ok(Action::Generate),
            "REFUSE" => Ok(Action::Refuse),
            "DECOMPOSE" => Ok(Action::Decompose),
            other => Err(format!(
                "Unknown action: {}. Valid: EXPLAIN, GENERATE, REFUSE, DECOMPOSE",
                other
            )),
        }
    }
}

/// Pipeline stages a route can enable or skip.
///
/// These are the names reported in `agents_to_run` / `agents_skipped`.
/// Ordering is the execution order, which keeps reported sets stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentSlot {
    Explain,
    Decompose,
    Generate,
    Evaluate,
    Test,
}

impl AgentSlot {
    pub const ALL: [AgentSlot; 5] = [
        AgentSlot::Explain,
        AgentSlot::Decompose,
        AgentSlot::Generate,
        AgentSlot::Evaluate,
        AgentSlot::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentSlot::Explain => "EXPLAIN",
            AgentSlot::Decompose => "DECOMPOSE",
            AgentSlot::Generate => "GENERATE",
            AgentSlot::Evaluate => "EVALUATE",
            AgentSlot::Test => "TEST",
        }
    }
}

impl std::fmt::Display for AgentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!("explain".parse::<Action>(), Ok(Action::Explain));
        assert_eq!(" GENERATE ".parse::<Action>(), Ok(Action::Generate));
        assert!("summarize".parse::<Action>().is_err());
    }

    #[test]
    fn test_slot_serialization() {
        let json = serde_json::to_string(&vec![AgentSlot::Explain, AgentSlot::Test]).unwrap();
        assert_eq!(json, r#"["EXPLAIN","TEST"]"#);
    }

    #[test]
    fn test_slot_order_is_execution_order() {
        let mut slots = vec![AgentSlot::Test, AgentSlot::Generate, AgentSlot::Explain];
        slots.sort();
        assert_eq!(
            slots,
            vec![AgentSlot::Explain, AgentSlot::Generate, AgentSlot::Test]
        );
    }
}
