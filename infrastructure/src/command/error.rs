//! Error types for the command adapter

use thiserror::Error;
use weaver_application::GatewayError;

/// Errors that can occur when running the LLM command
#[derive(Error, Debug)]
pub enum CommandGatewayError {
    #[error("LLM command is empty")]
    EmptyCommand,

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write prompt to stdin: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("`{command}` exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },
}

impl From<CommandGatewayError> for GatewayError {
    fn from(e: CommandGatewayError) -> Self {
        match e {
            CommandGatewayError::EmptyCommand | CommandGatewayError::Spawn { .. } => {
                GatewayError::ConnectionError(e.to_string())
            }
            CommandGatewayError::Stdin(_) | CommandGatewayError::NonZeroExit { .. } => {
                GatewayError::RequestFailed(e.to_string())
            }
        }
    }
}
