//! Command LLM Gateway implementation

use super::error::CommandGatewayError;
use super::session::CommandSession;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use weaver_application::{GatewayError, LlmGateway, LlmSession};
use weaver_domain::Model;

/// Placeholder replaced with the model name in command arguments
pub const MODEL_PLACEHOLDER: &str = "{model}";

/// The program and argument template shared by every session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Arguments with `{model}` substituted
    pub fn args_for(&self, model: &Model) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(MODEL_PLACEHOLDER, model.as_str()))
            .collect()
    }
}

/// LLM Gateway that shells out to a CLI for every prompt.
///
/// Sessions are stateless: each `send` is one process run, so a dropped
/// (timed out or cancelled) call kills its child process.
pub struct CommandLlmGateway {
    spec: Arc<CommandSpec>,
}

impl CommandLlmGateway {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, CommandGatewayError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(CommandGatewayError::EmptyCommand);
        }
        let spec = CommandSpec {
            program,
            args: args.into_iter().map(Into::into).collect(),
        };
        info!("CommandLlmGateway using `{}`", spec.program);
        Ok(Self {
            spec: Arc::new(spec),
        })
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }
}

#[async_trait]
impl LlmGateway for CommandLlmGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(CommandSession::new(
            Arc::clone(&self.spec),
            model.clone(),
            system_prompt,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_substitution() {
        let gateway =
            CommandLlmGateway::new("llm", ["--model", "{model}", "--tag={model}"]).unwrap();
        assert_eq!(
            gateway.spec().args_for(&Model::Gpt52Codex),
            vec!["--model", "gpt-5.2-codex", "--tag=gpt-5.2-codex"]
        );
    }

    #[test]
    fn test_empty_command_rejected() {
        let result = CommandLlmGateway::new("  ", Vec::<String>::new());
        assert!(matches!(result, Err(CommandGatewayError::EmptyCommand)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_round_trip() {
        let gateway = CommandLlmGateway::new("cat", Vec::<String>::new()).unwrap();
        let session = gateway
            .create_session_with_system_prompt(&Model::ClaudeHaiku45, "You are a router.")
            .await
            .unwrap();

        assert_eq!(session.model(), &Model::ClaudeHaiku45);
        let reply = session.send("Classify this").await.unwrap();
        assert!(reply.starts_with("You are a router."));
        assert!(reply.trim_end().ends_with("Classify this"));
    }
}
