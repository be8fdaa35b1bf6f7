//! One-shot command session

use super::error::CommandGatewayError;
use super::gateway::CommandSpec;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use weaver_application::{GatewayError, LlmSession};
use weaver_domain::Model;

/// A model plus system prompt; every `send` runs the command once
pub struct CommandSession {
    spec: Arc<CommandSpec>,
    model: Model,
    system_prompt: String,
}

impl CommandSession {
    pub fn new(spec: Arc<CommandSpec>, model: Model, system_prompt: impl Into<String>) -> Self {
        Self {
            spec,
            model,
            system_prompt: system_prompt.into(),
        }
    }

    /// What goes to stdin: system prompt, a blank line, then the prompt
    fn stdin_payload(&self, content: &str) -> String {
        if self.system_prompt.is_empty() {
            content.to_string()
        } else {
            format!("{}\n\n{}", self.system_prompt, content)
        }
    }

    async fn run(&self, content: &str) -> Result<String, CommandGatewayError> {
        let args = self.spec.args_for(&self.model);
        debug!("Running `{} {}`", self.spec.program, args.join(" "));

        let mut child = Command::new(&self.spec.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandGatewayError::Spawn {
                command: self.spec.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.stdin_payload(content).as_bytes())
                .await
                .map_err(CommandGatewayError::Stdin)?;
            // Closing stdin signals end of prompt
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| CommandGatewayError::Spawn {
                command: self.spec.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandGatewayError::NonZeroExit {
                command: self.spec.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl LlmSession for CommandSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        self.run(content).await.map_err(GatewayError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(program: &str, args: &[&str]) -> CommandSession {
        CommandSession::new(
            Arc::new(CommandSpec {
                program: program.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
            }),
            Model::Gpt5Mini,
            "system",
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_model_reaches_command() {
        let reply = session("sh", &["-c", "cat > /dev/null; echo {model}"])
            .send("prompt")
            .await
            .unwrap();
        assert_eq!(reply.trim(), "gpt-5-mini");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_request_failure() {
        let err = session("sh", &["-c", "cat > /dev/null; echo quota exceeded >&2; exit 3"])
            .send("prompt")
            .await
            .unwrap_err();
        match err {
            GatewayError::RequestFailed(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_connection_error() {
        let err = session("weaver-no-such-llm-binary", &[])
            .send("prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionError(_)));
    }
}
