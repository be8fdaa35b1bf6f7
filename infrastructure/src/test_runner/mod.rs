//! Test execution infrastructure
//!
//! [`ProcessTestRunner`] implements the
//! [`TestRunner`](weaver_application::TestRunner) port by materializing the
//! generated files in a temporary directory and running a test command there.

mod process;

pub use process::{ProcessTestRunner, extract_failures};
