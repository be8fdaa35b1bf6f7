//! Scripted adapters shared by the pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weaver_application::{
    ContextError, ContextProvider, ExecutionParams, GatewayError, LlmGateway, LlmSession,
    RunPipelineUseCase, TestRunner, TestRunnerError,
};
use weaver_domain::{
    AgentVariant, ContextSnippet, GeneratedCode, Model, PromptTemplate, Query, TestRun,
};

pub const GENERATED: &str = "```rust src/retry.rs\npub fn retry() -> u32 { 1 }\n```";
pub const TESTS: &str = "```rust tests/retry.rs\n#[test]\nfn retries() { assert_eq!(retry(), 3); }\n```";

#[derive(Clone)]
pub enum Reply {
    Text(String),
    /// Answer with the prompt itself, prefixed
    Echo,
    Fail,
    Hang,
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
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

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Echo => Ok(format!("answer to {}", content)),
            Reply::Fail => Err(GatewayError::RequestFailed("scripted failure".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Timeout)
            }
        }
    }
}

/// Gateway that answers per agent variant from scripted queues.
///
/// The variant is recovered from the system prompt. An exhausted queue
/// falls back to a per-variant default: EXPLAIN echoes, GENERATE and
/// TEST_GEN return a code block, everything else fails.
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<AgentVariant, VecDeque<Reply>>>,
    calls: Mutex<Vec<AgentVariant>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, variant: AgentVariant, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(variant)
            .or_default()
            .extend(replies);
        self
    }

    pub fn reply(self, variant: AgentVariant, reply: &str) -> Self {
        self.script(variant, [text(reply)])
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, variant: AgentVariant) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|v| **v == variant)
            .count()
    }

    fn default_reply(variant: AgentVariant) -> Reply {
        match variant {
            AgentVariant::Explain => Reply::Echo,
            AgentVariant::Generate => text(GENERATED),
            AgentVariant::TestGen => text(TESTS),
            _ => Reply::Fail,
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
        let variant = AgentVariant::ALL
            .into_iter()
            .find(|v| PromptTemplate::system_prompt(*v) == system_prompt)
            .ok_or_else(|| GatewayError::Other("unknown system prompt".to_string()))?;
        self.calls.lock().unwrap().push(variant);

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&variant)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Self::default_reply(variant));

        Ok(Box::new(ScriptedSession {
            model: model.clone(),
            reply,
        }))
    }
}

/// Test runner that replays scripted results and records what it was given
pub struct ScriptedRunner {
    results: Mutex<VecDeque<Result<TestRun, TestRunnerError>>>,
    seen_code: Mutex<Vec<GeneratedCode>>,
    calls: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(results: Vec<Result<TestRun, TestRunnerError>>) -> Self {
        Self {
            results: Mutex::new(VecDeque::from(results)),
            seen_code: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_code(&self) -> Vec<GeneratedCode> {
        self.seen_code.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestRunner for ScriptedRunner {
    async fn run(
        &self,
        code: &GeneratedCode,
        _tests: &GeneratedCode,
    ) -> Result<TestRun, TestRunnerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_code.lock().unwrap().push(code.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(fail()))
    }
}

pub fn pass() -> TestRun {
    TestRun::passed("test result: ok. 1 passed; 0 failed")
}

pub fn fail() -> TestRun {
    TestRun::failed(
        "test retries ... FAILED",
        vec!["retries: assertion `left == right` failed".to_string()],
    )
}

pub struct StaticContext(pub Result<Vec<ContextSnippet>, String>);

#[async_trait]
impl ContextProvider for StaticContext {
    async fn get_context(&self, _query: &Query) -> Result<Vec<ContextSnippet>, ContextError> {
        self.0.clone().map_err(ContextError::Other)
    }
}

pub fn fast_params() -> ExecutionParams {
    ExecutionParams::default()
        .with_max_retries(0)
        .with_agent_timeout(Duration::from_secs(5))
}

pub fn pipeline(gateway: Arc<ScriptedGateway>, runner: Arc<ScriptedRunner>) -> RunPipelineUseCase {
    RunPipelineUseCase::new(gateway, Arc::new(StaticContext(Ok(Vec::new()))), runner)
        .with_params(fast_params())
}

pub fn query(text: &str) -> Query {
    Query::try_new(text).unwrap()
}

pub fn classify(primary: &str) -> String {
    format!(
        r#"{{"primary": "{}", "confidence": 0.9, "reasoning": "scripted"}}"#,
        primary
    )
}
