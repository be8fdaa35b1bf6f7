//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// LLM models an agent can be bound to (Value Object)
///
/// Unknown names are kept verbatim as [`Model::Custom`], so any model the
/// configured gateway understands can be used without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    ClaudeOpus46,
    ClaudeSonnet46,
    ClaudeSonnet45,
    ClaudeHaiku45,
    Gpt52Codex,
    Gpt52,
    Gpt5Mini,
    Gemini3Pro,
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::ClaudeOpus46 => "claude-opus-4.6",
            Model::ClaudeSonnet46 => "claude-sonnet-4.6",
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::Gpt52Codex => "gpt-5.2-codex",
            Model::Gpt52 => "gpt-5.2",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::Gemini3Pro => "gemini-3-pro-preview",
            Model::Custom(s) => s,
        }
    }

    /// Cheap models suited to classification and planning calls
    pub fn is_lightweight(&self) -> bool {
        matches!(self, Model::ClaudeHaiku45 | Model::Gpt5Mini)
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::ClaudeSonnet45
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "claude-opus-4.6" => Model::ClaudeOpus46,
            "claude-sonnet-4.6" => Model::ClaudeSonnet46,
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "gpt-5.2-codex" => Model::Gpt52Codex,
            "gpt-5.2" => Model::Gpt52,
            "gpt-5-mini" => Model::Gpt5Mini,
            "gemini-3-pro-preview" => Model::Gemini3Pro,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        for model in [Model::ClaudeSonnet45, Model::Gpt52Codex, Model::Gemini3Pro] {
            let parsed = Model::from(model.to_string().as_str());
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model = Model::from("local-llama-70b");
        assert_eq!(model, Model::Custom("local-llama-70b".to_string()));
        assert_eq!(model.to_string(), "local-llama-70b");
    }

    #[test]
    fn test_lightweight_detection() {
        assert!(Model::ClaudeHaiku45.is_lightweight());
        assert!(!Model::ClaudeOpus46.is_lightweight());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Model::Gpt52Codex).unwrap();
        assert_eq!(json, "\"gpt-5.2-codex\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Model::Gpt52Codex);
    }
}
