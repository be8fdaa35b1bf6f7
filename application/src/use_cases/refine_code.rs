//! Refine Code use case
//!
//! Phase C: a strictly sequential generate → test → repair loop.
//!
//! Each iteration generates (or repairs) the code, asks TEST_GEN for a test
//! suite, and hands both to the [`TestRunner`]. The loop stops on the first
//! passing iteration or when the iteration budget is spent. Nothing in here
//! is fatal except cancellation: agent failures and tooling errors become
//! failed iterations that consume budget.

use super::invoke_agent::AgentInvoker;
use super::shared::{Cancelled, RequestContext, check_cancelled};
use crate::ports::test_runner::TestRunner;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use weaver_domain::{
    AgentTask, AgentVariant, ContextSnippet, GeneratedCode, PipelinePhase, PromptTemplate,
    RefinementIteration, RefinementSession, TestRun,
};

/// Errors that can occur during refinement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefineError {
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<Cancelled> for RefineError {
    fn from(_: Cancelled) -> Self {
        RefineError::Cancelled
    }
}

/// Session plus every agent task the loop ran
#[derive(Debug, Clone)]
pub struct RefinementRun {
    pub session: RefinementSession,
    pub tasks: Vec<AgentTask>,
}

/// What one iteration produced before the test run
enum Draft {
    Ready {
        code: GeneratedCode,
        tests: GeneratedCode,
    },
    Failed(RefinementIteration),
}

/// Use case for the bounded refinement loop
#[derive(Clone)]
pub struct RefineCodeUseCase {
    invoker: AgentInvoker,
    test_runner: Arc<dyn TestRunner>,
}

impl RefineCodeUseCase {
    pub fn new(invoker: AgentInvoker, test_runner: Arc<dyn TestRunner>) -> Self {
        Self {
            invoker,
            test_runner,
        }
    }

    /// Generate from scratch and refine until the tests pass
    pub async fn execute(
        &self,
        request_text: &str,
        context: &[ContextSnippet],
        ctx: &RequestContext,
    ) -> Result<RefinementRun, RefineError> {
        self.execute_from(request_text, context, None, ctx).await
    }

    /// Refine starting from already generated code.
    ///
    /// With `initial_code`, iteration 1 tests that code as-is instead of
    /// calling GENERATE.
    pub async fn execute_from(
        &self,
        request_text: &str,
        context: &[ContextSnippet],
        initial_code: Option<GeneratedCode>,
        ctx: &RequestContext,
    ) -> Result<RefinementRun, RefineError> {
        check_cancelled(ctx)?;
        let mut session = RefinementSession::new();
        let mut tasks = Vec::new();
        let mut seed = initial_code;

        info!(
            "[{}] Refinement: up to {} iteration(s)",
            ctx.request_id,
            session.max_iterations()
        );
        ctx.progress
            .on_phase_start(PipelinePhase::Refinement, session.max_iterations());

        while !session.is_finished() {
            check_cancelled(ctx)?;
            let index = session.next_index();
            let previous = session.last().cloned();

            let (code, action) = match (seed.take(), &previous) {
                (Some(code), None) => (Ok(code), "test evaluated code".to_string()),
                (_, None) => {
                    let prompt = PromptTemplate::generate_prompt(request_text, context);
                    let result = self
                        .run_agent(AgentVariant::Generate, index, prompt, &mut tasks, ctx)
                        .await?;
                    (
                        result.map(|text| GeneratedCode::from_response(&text)),
                        "initial generation".to_string(),
                    )
                }
                (_, Some(prev)) => {
                    let prompt = PromptTemplate::repair_prompt(request_text, context, prev);
                    let result = self
                        .run_agent(AgentVariant::Generate, index, prompt, &mut tasks, ctx)
                        .await?;
                    (
                        result.map(|text| GeneratedCode::from_response(&text)),
                        format!("repair after attempt {} ({})", prev.index(), prev.outcome()),
                    )
                }
            };

            let draft = match code {
                Err(error) => {
                    let last_code = previous.map(|p| p.code().clone()).unwrap_or_default();
                    Draft::Failed(RefinementIteration::agent_failure(
                        index,
                        last_code,
                        GeneratedCode::default(),
                        &action,
                        AgentVariant::Generate.as_str(),
                        &error,
                    ))
                }
                Ok(code) => {
                    let prompt = PromptTemplate::test_gen_prompt(request_text, &code);
                    match self
                        .run_agent(AgentVariant::TestGen, index, prompt, &mut tasks, ctx)
                        .await?
                    {
                        Ok(text) => Draft::Ready {
                            code,
                            tests: GeneratedCode::from_response(&text),
                        },
                        Err(error) => Draft::Failed(RefinementIteration::agent_failure(
                            index,
                            code,
                            GeneratedCode::default(),
                            &action,
                            AgentVariant::TestGen.as_str(),
                            &error,
                        )),
                    }
                }
            };

            let iteration = match draft {
                Draft::Failed(iteration) => iteration,
                Draft::Ready { code, tests } => {
                    let run = self.run_tests(&code, &tests, ctx).await?;
                    match run {
                        Ok(run) => {
                            RefinementIteration::from_test_run(index, code, tests, &action, run)
                        }
                        Err(message) => {
                            RefinementIteration::tooling_error(index, code, tests, &action, message)
                        }
                    }
                }
            };

            info!(
                "[{}] Refinement iteration {}/{}: {}",
                ctx.request_id,
                index,
                session.max_iterations(),
                iteration.outcome()
            );
            ctx.log(
                "refinement_iteration",
                json!({
                    "index": iteration.index(),
                    "outcome": iteration.outcome().as_str(),
                    "tests_passed": iteration.tests_passed(),
                    "refinement_action": iteration.refinement_action(),
                    "failures": iteration.failures(),
                    "files": iteration.code().len(),
                }),
            );

            if let Err(e) = session.record(iteration) {
                warn!("[{}] Refinement stopped: {}", ctx.request_id, e);
                break;
            }
            if let Some(recorded) = session.last() {
                ctx.progress.on_refinement_iteration(recorded);
            }
        }

        if session.success() {
            info!(
                "[{}] Refinement passed after {} iteration(s)",
                ctx.request_id,
                session.total_iterations()
            );
        } else {
            warn!(
                "[{}] Refinement gave up after {} iteration(s)",
                ctx.request_id,
                session.total_iterations()
            );
        }
        ctx.progress.on_phase_complete(PipelinePhase::Refinement);

        Ok(RefinementRun { session, tasks })
    }

    /// Invoke one agent; `Ok(Err(_))` is an agent failure, `Err` is cancellation.
    async fn run_agent(
        &self,
        variant: AgentVariant,
        index: usize,
        prompt: String,
        tasks: &mut Vec<AgentTask>,
        ctx: &RequestContext,
    ) -> Result<Result<String, String>, Cancelled> {
        let mut task = AgentTask::new(variant, prompt);
        if index > 1 {
            task = task.with_label(format!("{}#{}", variant, index));
        }
        let task = self.invoker.invoke(task, &ctx.cancellation).await;
        check_cancelled(ctx)?;
        ctx.record_task(PipelinePhase::Refinement, &task);

        let result = match task.output_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(task.error().unwrap_or("no output").to_string()),
        };
        tasks.push(task);
        Ok(result)
    }

    /// Run the test suite; `Ok(Err(_))` is a tooling error.
    async fn run_tests(
        &self,
        code: &GeneratedCode,
        tests: &GeneratedCode,
        ctx: &RequestContext,
    ) -> Result<Result<TestRun, String>, Cancelled> {
        debug!(
            "[{}] Running {} test file(s) against {} code file(s)",
            ctx.request_id,
            tests.len(),
            code.len()
        );
        tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => Err(Cancelled),
            result = self.test_runner.run(code, tests) => {
                Ok(result.map_err(|e| {
                    warn!("[{}] Test runner error: {}", ctx.request_id, e);
                    e.to_string()
                }))
            }
        }
    }
}
