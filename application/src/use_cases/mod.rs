//! Use cases (application services)
//!
//! - [`route_query`]: safety gate + classifier → [`Route`](weaver_domain::Route)
//! - [`evaluate_code`]: CRITIC ∥ DEFENDER → controller decision
//! - [`refine_code`]: bounded generate → test → repair loop
//! - [`run_pipeline`]: the full request: route, phases A/B/C, decomposition
//! - [`invoke_agent`]: the single entry point every agent call goes through

pub mod evaluate_code;
pub mod invoke_agent;
pub mod refine_code;
pub mod route_query;
pub mod run_pipeline;
pub mod shared;
