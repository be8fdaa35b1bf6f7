//! Configuration file loading for code-weaver
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `WEAVER_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./weaver.toml` or `./.weaver.toml`
//! 4. Global: `$XDG_CONFIG_HOME/code-weaver/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileEvaluationConfig, FileGatewayConfig,
    FileLoggingConfig, FileModelsConfig, FileOutputConfig, FilePipelineConfig, FileRouterConfig,
    FileTestRunnerConfig,
};
pub use loader::ConfigLoader;
