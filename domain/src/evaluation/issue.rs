//! Review issues

use serde::{Deserialize, Serialize};

/// Severity of a review issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Low => "LOW",
            IssueSeverity::Medium => "MEDIUM",
            IssueSeverity::High => "HIGH",
            IssueSeverity::Critical => "CRITICAL",
        }
    }

    /// HIGH and CRITICAL issues force a revision
    pub fn is_blocking(&self) -> bool {
        matches!(self, IssueSeverity::High | IssueSeverity::Critical)
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IssueSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" | "MINOR" | "INFO" => Ok(IssueSeverity::Low),
            "MEDIUM" | "MODERATE" => Ok(IssueSeverity::Medium),
            "HIGH" | "MAJOR" => Ok(IssueSeverity::High),
            "CRITICAL" | "BLOCKER" => Ok(IssueSeverity::Critical),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// One finding from a reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub severity: IssueSeverity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ReviewIssue {
    pub fn new(severity: IssueSeverity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// The placeholder issue recorded when a reviewer could not answer.
    ///
    /// MEDIUM on purpose: an outage alone must not force a revision.
    pub fn reviewer_unavailable(reviewer: &str, cause: &str) -> Self {
        Self::new(
            IssueSeverity::Medium,
            format!("{} reviewer unavailable: {}", reviewer, cause),
        )
    }
}

impl std::fmt::Display for ReviewIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "[{}] {}: {}", self.severity, file, self.description),
            None => write!(f, "[{}] {}", self.severity, self.description),
        }
    }
}
