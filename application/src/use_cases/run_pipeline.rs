//! Run Pipeline use case
//!
//! One request end to end:
//!
//! ```text
//! route ─▶ REFUSE ───────────────────────────────▶ result
//!       ├▶ DECOMPOSE: PLANNER ─▶ EXPLAIN × N ────▶ result
//!       └▶ Phase A: EXPLAIN ∥ GENERATE
//!            └▶ Phase B: evaluation (if code was generated)
//!                 └▶ Phase C: refinement (unless revision was requested)
//! ```
//!
//! Agent, reviewer and tooling failures are reported on the result and
//! never stop the run. Cancellation is the only error.

use super::evaluate_code::EvaluateCodeUseCase;
use super::invoke_agent::AgentInvoker;
use super::refine_code::{RefineCodeUseCase, RefineError};
use super::route_query::RouteQueryUseCase;
use super::shared::{Cancelled, RequestContext, check_cancelled, join_all_cancellable};
use crate::config::ExecutionParams;
use crate::ports::context_provider::ContextProvider;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::test_runner::TestRunner;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use weaver_domain::{
    AgentSlot, AgentTask, AgentVariant, CodeChoice, ContextSnippet, Decision,
    DecompositionResult, DomainError, EvaluationPolicy, GeneratedCode, IterationOutcome,
    ModelConfig, Notice, PipelinePhase, PipelineResult, PromptTemplate, Query, SafetyGate,
    SubAnswer, parse_subquestions,
};

/// Errors that stop a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<Cancelled> for PipelineError {
    fn from(_: Cancelled) -> Self {
        PipelineError::Cancelled
    }
}

impl From<RefineError> for PipelineError {
    fn from(e: RefineError) -> Self {
        match e {
            RefineError::Cancelled => PipelineError::Cancelled,
        }
    }
}

/// Use case for running the full pipeline on a query
pub struct RunPipelineUseCase {
    gateway: Arc<dyn LlmGateway>,
    context_provider: Arc<dyn ContextProvider>,
    test_runner: Arc<dyn TestRunner>,
    models: ModelConfig,
    params: ExecutionParams,
    policy: EvaluationPolicy,
    gate: SafetyGate,
}

impl RunPipelineUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        context_provider: Arc<dyn ContextProvider>,
        test_runner: Arc<dyn TestRunner>,
    ) -> Self {
        Self {
            gateway,
            context_provider,
            test_runner,
            models: ModelConfig::default(),
            params: ExecutionParams::default(),
            policy: EvaluationPolicy::default(),
            gate: SafetyGate::new(),
        }
    }

    pub fn with_models(mut self, models: ModelConfig) -> Self {
        self.models = models;
        self
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_policy(mut self, policy: EvaluationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_safety_gate(mut self, gate: SafetyGate) -> Self {
        self.gate = gate;
        self
    }

    fn invoker(&self) -> AgentInvoker {
        AgentInvoker::new(self.gateway.clone(), self.models.clone(), self.params.clone())
    }

    /// Run with a fresh request context (no progress, no transcript)
    pub async fn execute(&self, query: &Query) -> Result<PipelineResult, PipelineError> {
        let ctx = RequestContext::new(query.id().clone());
        self.execute_with_context(query, &ctx).await
    }

    pub async fn execute_with_context(
        &self,
        query: &Query,
        ctx: &RequestContext,
    ) -> Result<PipelineResult, PipelineError> {
        check_cancelled(ctx)?;
        info!("[{}] Pipeline started", ctx.request_id);
        let invoker = self.invoker();

        let (route, classifier_task) = RouteQueryUseCase::new(invoker.clone())
            .with_safety_gate(self.gate.clone())
            .execute_with_context(query, ctx)
            .await;
        check_cancelled(ctx)?;

        let mut result = PipelineResult::for_route(route);
        result.tasks.extend(classifier_task);

        if result.route.is_refusal() {
            let reason = result.route.reason().to_string();
            result.notice(Notice::warning(format!("Request refused: {}", reason)));
            return Ok(result);
        }

        let context = match self.context_provider.get_context(query).await {
            Ok(snippets) => {
                debug!(
                    "[{}] {} context snippet(s)",
                    ctx.request_id,
                    snippets.len()
                );
                snippets
            }
            Err(e) => {
                warn!("[{}] Context unavailable: {}", ctx.request_id, e);
                result.notice(Notice::warning(format!("Context unavailable: {}", e)));
                Vec::new()
            }
        };
        check_cancelled(ctx)?;

        if result.route.runs(AgentSlot::Decompose) {
            self.decompose(query, &context, &invoker, &mut result, ctx)
                .await?;
            info!("[{}] Pipeline finished", ctx.request_id);
            return Ok(result);
        }

        self.phase_answer(query, &context, &invoker, &mut result, ctx)
            .await?;

        let Some(code) = result.generate_result.clone() else {
            if result.route.runs(AgentSlot::Generate) {
                let reason = "no generated code to evaluate";
                result.mark_skipped(AgentSlot::Evaluate, reason);
                result.mark_skipped(AgentSlot::Test, reason);
                ctx.record_skip(PipelinePhase::Evaluation, reason);
                ctx.record_skip(PipelinePhase::Refinement, reason);
            }
            info!("[{}] Pipeline finished", ctx.request_id);
            return Ok(result);
        };

        // Phase B
        let evaluation = EvaluateCodeUseCase::new(invoker.clone())
            .with_policy(self.policy)
            .execute(query.text(), &code, &context, ctx)
            .await?;
        result.mark_used(AgentSlot::Evaluate);
        result.tasks.extend(evaluation.tasks);
        for notice in evaluation.verdict.notices() {
            result.notice(Notice::warning(notice.clone()));
        }
        let decision = evaluation.verdict.decision();
        let selected = evaluation.verdict.selected_code(CodeChoice::Improved);
        result.evaluation = Some(evaluation.verdict);

        if decision == Decision::RequestRevision {
            let reason = "deferred: evaluation requested revision";
            result.mark_skipped(AgentSlot::Test, reason);
            ctx.record_skip(PipelinePhase::Refinement, reason);
            result.notice(Notice::info(
                "Evaluation requested a revision; tests were not generated",
            ));
            info!("[{}] Pipeline finished", ctx.request_id);
            return Ok(result);
        }

        // Phase C
        let refinement = RefineCodeUseCase::new(invoker, self.test_runner.clone())
            .execute_from(query.text(), &context, Some(selected), ctx)
            .await?;
        result.mark_used(AgentSlot::Test);
        result.tasks.extend(refinement.tasks);

        let session = refinement.session;
        let unverified = session
            .iterations()
            .iter()
            .filter(|i| i.outcome() == IterationOutcome::ToolingError)
            .count();
        if unverified > 0 {
            result.notice(Notice::warning(format!(
                "could not verify: test tooling failed in {} iteration(s)",
                unverified
            )));
        }
        if !session.success() {
            result.notice(Notice::warning(format!(
                "Tests still failing after {} iteration(s)",
                session.total_iterations()
            )));
        }
        result.refinement = Some(session);

        info!("[{}] Pipeline finished", ctx.request_id);
        Ok(result)
    }

    /// Phase A: EXPLAIN and GENERATE in parallel, closed by a barrier
    async fn phase_answer(
        &self,
        query: &Query,
        context: &[ContextSnippet],
        invoker: &AgentInvoker,
        result: &mut PipelineResult,
        ctx: &RequestContext,
    ) -> Result<(), PipelineError> {
        let mut join_set = JoinSet::new();
        let mut planned = Vec::new();
        if result.route.runs(AgentSlot::Explain) {
            planned.push(AgentTask::new(
                AgentVariant::Explain,
                PromptTemplate::explain_prompt(query.text(), context),
            ));
        }
        if result.route.runs(AgentSlot::Generate) {
            planned.push(AgentTask::new(
                AgentVariant::Generate,
                PromptTemplate::generate_prompt(query.text(), context),
            ));
        }

        info!(
            "[{}] {} ({} agent(s))",
            ctx.request_id,
            PipelinePhase::Answer,
            planned.len()
        );
        ctx.progress
            .on_phase_start(PipelinePhase::Answer, planned.len());

        for task in planned {
            let invoker = invoker.clone();
            let token = ctx.cancellation.clone();
            join_set.spawn(async move { invoker.invoke(task, &token).await });
        }

        let mut finished = join_all_cancellable(join_set, &ctx.cancellation).await?;
        check_cancelled(ctx)?;
        finished.sort_by_key(|t| t.variant);

        for task in finished {
            ctx.record_task(PipelinePhase::Answer, &task);
            match task.variant {
                AgentVariant::Explain => {
                    result.mark_used(AgentSlot::Explain);
                    match task.output_text() {
                        Some(text) => result.explain_result = Some(text.to_string()),
                        None => result.notice(Notice::warning(format!(
                            "EXPLAIN failed: {}",
                            task.error().unwrap_or("unknown error")
                        ))),
                    }
                }
                _ => {
                    result.mark_used(AgentSlot::Generate);
                    let code = task.output_text().map(GeneratedCode::from_response);
                    match code {
                        Some(code) if !code.is_empty() => result.generate_result = Some(code),
                        _ => result.notice(Notice::warning(format!(
                            "GENERATE failed: {}",
                            task.error().unwrap_or("no code in response")
                        ))),
                    }
                }
            }
            result.tasks.push(task);
        }

        ctx.progress.on_phase_complete(PipelinePhase::Answer);
        Ok(())
    }

    /// DECOMPOSE: plan sub-questions, answer them concurrently, reassemble
    /// in plan order
    async fn decompose(
        &self,
        query: &Query,
        context: &[ContextSnippet],
        invoker: &AgentInvoker,
        result: &mut PipelineResult,
        ctx: &RequestContext,
    ) -> Result<(), PipelineError> {
        let max = self.params.max_subquestions;
        ctx.progress.on_phase_start(PipelinePhase::Decompose, 1);

        let planner = invoker
            .invoke(
                AgentTask::new(
                    AgentVariant::Planner,
                    PromptTemplate::planner_prompt(query.text(), max),
                ),
                &ctx.cancellation,
            )
            .await;
        check_cancelled(ctx)?;
        ctx.record_task(PipelinePhase::Decompose, &planner);
        result.mark_used(AgentSlot::Decompose);

        let mut questions = planner
            .output_text()
            .map(parse_subquestions)
            .unwrap_or_default();
        result.tasks.push(planner);

        let planner_fallback = questions.is_empty();
        if planner_fallback {
            warn!(
                "[{}] Planner produced no sub-questions; answering the query as-is",
                ctx.request_id
            );
            result.notice(Notice::warning(
                "Planner unavailable; query answered without decomposition",
            ));
            questions.push(query.text().to_string());
        }
        if questions.len() > max {
            debug!(
                "[{}] Capping {} sub-questions at {}",
                ctx.request_id,
                questions.len(),
                max
            );
            questions.truncate(max);
        }

        info!(
            "[{}] Decomposed into {} sub-question(s)",
            ctx.request_id,
            questions.len()
        );

        let mut join_set = JoinSet::new();
        for (i, question) in questions.iter().enumerate() {
            let task = AgentTask::new(
                AgentVariant::Explain,
                PromptTemplate::explain_prompt(question, context),
            )
            .with_label(format!("EXPLAIN#{}", i + 1));
            let invoker = invoker.clone();
            let token = ctx.cancellation.clone();
            join_set.spawn(async move { (i, invoker.invoke(task, &token).await) });
        }

        let mut finished = join_all_cancellable(join_set, &ctx.cancellation).await?;
        check_cancelled(ctx)?;
        finished.sort_by_key(|(i, _)| *i);

        let mut answers: Vec<SubAnswer> = questions
            .iter()
            .map(|q| SubAnswer {
                question: q.clone(),
                answer: None,
            })
            .collect();
        for (i, task) in finished {
            ctx.record_task(PipelinePhase::Decompose, &task);
            if let Some(slot) = answers.get_mut(i) {
                slot.answer = task.output_text().map(str::to_string);
            }
            result.tasks.push(task);
        }
        result.mark_used(AgentSlot::Explain);

        let decomposition = DecompositionResult {
            answers,
            planner_fallback,
        };
        if decomposition.answered() < decomposition.answers.len() {
            result.notice(Notice::warning(format!(
                "{} of {} sub-question(s) could not be answered",
                decomposition.answers.len() - decomposition.answered(),
                decomposition.answers.len()
            )));
        }
        result.decomposition = Some(decomposition);

        ctx.progress.on_phase_complete(PipelinePhase::Decompose);
        Ok(())
    }
}
