//! Domain layer for code-weaver
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Route
//!
//! Every [`Query`] is classified once into a [`Route`]: which agents run,
//! which are skipped, and how confident the router was.
//!
//! ## Phases
//!
//! - **Phase A**: EXPLAIN / GENERATE agents run concurrently
//! - **Phase B**: CRITIC and DEFENDER review generated code, the controller arbitrates
//! - **Phase C**: test generation and the bounded refinement loop
//!
//! ## Evaluation
//!
//! [`EvaluationPolicy`] turns two typed reviewer verdicts into one
//! [`Decision`]. No free-text matching happens past the parsing boundary.

pub mod agent;
pub mod code;
pub mod config;
pub mod context;
pub mod core;
pub mod evaluation;
pub mod pipeline;
pub mod prompt;
pub mod refinement;
pub mod routing;
pub mod util;

// Re-export commonly used types
pub use agent::{
    model_config::ModelConfig,
    task::{AgentOutput, AgentTask, TaskStatus},
    variant::AgentVariant,
};
pub use code::{CodeChange, GENERATED_CRATE_NAME, GeneratedCode, parse_code_blocks};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use context::ContextSnippet;
pub use core::{
    error::DomainError,
    model::Model,
    query::{Attachment, Query, RequestId},
};
pub use evaluation::{
    CodeChoice, ControllerVerdict, CriticVerdict, Decision, DefenderVerdict, EvaluationPolicy,
    EvaluationVerdict, IssueSeverity, MergeProposal, ReviewIssue, mean_score,
    parse_controller_response, parse_critic_response, parse_defender_response,
};
pub use pipeline::{
    DecompositionResult, Notice, NoticeLevel, PipelinePhase, PipelineResult, SkippedAgent,
    SubAnswer,
};
pub use prompt::PromptTemplate;
pub use refinement::{
    IterationOutcome, MAX_REFINEMENT_ITERATIONS, RefinementIteration, RefinementSession, TestRun,
};
pub use routing::{
    Action, AgentSlot, ClassifierJudgment, IntentSignals, Route, SafetyGate,
    parse_classifier_response, parse_subquestions,
};
