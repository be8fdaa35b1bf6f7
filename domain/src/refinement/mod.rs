//! Bounded generate → test → repair loop
//!
//! - [`iteration::RefinementIteration`]: one recorded attempt
//! - [`session::RefinementSession`]: the ordered attempts of one request
//!
//! A session never holds more than [`MAX_REFINEMENT_ITERATIONS`] iterations
//! and stops accepting new ones after the first pass.

pub mod iteration;
pub mod session;

pub use iteration::{IterationOutcome, RefinementIteration, TestRun};
pub use session::RefinementSession;

/// Hard upper bound on refinement iterations per request
pub const MAX_REFINEMENT_ITERATIONS: usize = 4;
