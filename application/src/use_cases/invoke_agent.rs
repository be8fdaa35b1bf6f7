//! Agent invocation
//!
//! Every agent call, whatever its variant, goes through
//! [`AgentInvoker::invoke`]: pick the variant's model and system prompt,
//! send the task input, and apply timeout, bounded retry and cancellation.

use crate::config::ExecutionParams;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use weaver_domain::{AgentOutput, AgentTask, Model, ModelConfig, PromptTemplate};

/// Uniform call contract over all agent variants.
///
/// Cheap to clone; parallel phases hand a clone to each spawned task.
#[derive(Clone)]
pub struct AgentInvoker {
    gateway: Arc<dyn LlmGateway>,
    models: ModelConfig,
    params: ExecutionParams,
}

impl AgentInvoker {
    pub fn new(gateway: Arc<dyn LlmGateway>, models: ModelConfig, params: ExecutionParams) -> Self {
        Self {
            gateway,
            models,
            params,
        }
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    /// Run a task to DONE or FAILED.
    ///
    /// Never returns an error: timeouts, gateway errors, empty responses and
    /// retry exhaustion all end in a FAILED task. Cancellation also fails
    /// the task (with "cancelled"); callers check the token after their
    /// barrier.
    pub async fn invoke(&self, mut task: AgentTask, token: &CancellationToken) -> AgentTask {
        let model = self.models.model_for(task.variant).clone();
        let system_prompt = PromptTemplate::system_prompt(task.variant);
        let max_attempts = self.params.max_attempts();
        let started = Instant::now();
        let elapsed = |started: Instant| started.elapsed().as_millis() as u64;

        let input = task.input.clone();
        task.start();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let backoff = self.params.backoff_for(attempt - 1);
                debug!(
                    "{} retry {}/{} after {:?}",
                    task.label,
                    attempt - 1,
                    max_attempts - 1,
                    backoff
                );
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        task.fail("cancelled", attempt - 1, elapsed(started));
                        return task;
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
            }

            let call = self.call_once(&model, system_prompt, &input);
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    task.fail("cancelled", attempt, elapsed(started));
                    return task;
                }
                outcome = tokio::time::timeout(self.params.agent_timeout, call) => outcome,
            };

            match outcome {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    task.complete(
                        AgentOutput::new(model.clone(), text),
                        attempt,
                        elapsed(started),
                    );
                    return task;
                }
                Ok(Ok(_)) => {
                    last_error = "empty response".to_string();
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                }
                Err(_) => {
                    last_error = format!(
                        "timed out after {}s",
                        self.params.agent_timeout.as_secs_f64()
                    );
                }
            }
            warn!(
                "{} attempt {}/{} on {} failed: {}",
                task.label, attempt, max_attempts, model, last_error
            );
        }

        task.fail(last_error, max_attempts, elapsed(started));
        task
    }

    async fn call_once(
        &self,
        model: &Model,
        system_prompt: &str,
        input: &str,
    ) -> Result<String, GatewayError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(model, system_prompt)
            .await?;
        session.send(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::LlmSession;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use weaver_domain::{AgentVariant, TaskStatus};

    // ==================== Test Mocks ====================

    enum Reply {
        Text(&'static str),
        Error,
        Hang,
    }

    struct ScriptedSession {
        model: Model,
        reply: Reply,
    }

    #[async_trait]
    impl LlmSession for ScriptedSession {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn send(&self, _content: &str) -> Result<String, GatewayError> {
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Error => Err(GatewayError::RequestFailed("boom".to_string())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }
    }

    struct ScriptedGateway {
        replies: Mutex<VecDeque<Reply>>,
        calls: AtomicUsize,
        system_prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from(replies)),
                calls: AtomicUsize::new(0),
                system_prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn create_session_with_system_prompt(
            &self,
            model: &Model,
            system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.system_prompts
                .lock()
                .unwrap()
                .push(system_prompt.to_string());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Reply::Error);
            Ok(Box::new(ScriptedSession {
                model: model.clone(),
                reply,
            }))
        }
    }

    fn invoker(gateway: Arc<ScriptedGateway>, params: ExecutionParams) -> AgentInvoker {
        AgentInvoker::new(gateway, ModelConfig::default(), params)
    }

    fn fast_params() -> ExecutionParams {
        ExecutionParams::default()
            .with_retry_backoff(Duration::from_millis(1))
            .with_agent_timeout(Duration::from_millis(50))
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_success_first_attempt() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::Text("answer")]));
        let task = invoker(gateway.clone(), fast_params())
            .invoke(
                AgentTask::new(AgentVariant::Explain, "How?"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(task.status(), TaskStatus::Done);
        assert_eq!(task.output_text(), Some("answer"));
        assert_eq!(task.attempts(), 1);
        assert_eq!(task.output().unwrap().model, ModelConfig::default().explain);
        assert_eq!(
            gateway.system_prompts.lock().unwrap()[0],
            PromptTemplate::system_prompt(AgentVariant::Explain)
        );
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Reply::Error,
            Reply::Text("second time lucky"),
        ]));
        let task = invoker(gateway.clone(), fast_params())
            .invoke(
                AgentTask::new(AgentVariant::Generate, "Add it"),
                &CancellationToken::new(),
            )
            .await;

        assert!(task.is_done());
        assert_eq!(task.attempts(), 2);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_fails() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::Error, Reply::Error]));
        let task = invoker(gateway.clone(), fast_params())
            .invoke(
                AgentTask::new(AgentVariant::Critic, "Review"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.attempts(), 2);
        assert!(task.error().unwrap().contains("boom"));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::Hang]));
        let task = invoker(gateway, fast_params().with_max_retries(0))
            .invoke(
                AgentTask::new(AgentVariant::Defender, "Review"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(task.status(), TaskStatus::Failed);
        assert!(task.error().unwrap().starts_with("timed out"));
    }

    #[tokio::test]
    async fn test_empty_response_is_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::Text("  ")]));
        let task = invoker(gateway, fast_params().with_max_retries(0))
            .invoke(
                AgentTask::new(AgentVariant::Explain, "How?"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(task.error(), Some("empty response"));
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Reply::Text("never")]));
        let token = CancellationToken::new();
        token.cancel();
        let task = invoker(gateway, fast_params())
            .invoke(AgentTask::new(AgentVariant::Explain, "How?"), &token)
            .await;

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.error(), Some("cancelled"));
    }
}
