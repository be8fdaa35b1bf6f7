//! Routing domain
//!
//! Everything the router needs to turn a query into a [`Route`]:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`action`] | Route actions and the agent slots a route enables |
//! | [`route`] | The immutable routing decision |
//! | [`safety`] | Unsafe-intent gate that short-circuits to REFUSE |
//! | [`intent`] | Lexical signals (question / change request / breadth) |
//! | [`parsing`] | Structured classifier and planner response parsing |

pub mod action;
pub mod intent;
pub mod parsing;
pub mod route;
pub mod safety;

pub use action::{Action, AgentSlot};
pub use intent::IntentSignals;
pub use parsing::{ClassifierJudgment, parse_classifier_response, parse_subquestions};
pub use route::Route;
pub use safety::SafetyGate;
