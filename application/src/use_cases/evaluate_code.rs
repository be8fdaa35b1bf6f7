//! Evaluate Code use case
//!
//! Phase B of the pipeline, also usable on its own:
//!
//! ```text
//! CRITIC ─┐
//!         ├─ barrier ─▶ EvaluationPolicy::decide ─▶ ACCEPT_ORIGINAL
//! DEFENDER┘                                     ├─▶ REQUEST_REVISION
//!                                               └─▶ MERGE_FEEDBACK ─▶ CONTROLLER
//! ```
//!
//! A reviewer that fails, times out or answers without a score gets the
//! neutral score and a "reviewer unavailable" issue; the evaluation itself
//! never fails except on cancellation.

use super::invoke_agent::AgentInvoker;
use super::run_pipeline::PipelineError;
use super::shared::{RequestContext, check_cancelled, join_all_cancellable};
use serde_json::json;
use std::collections::BTreeMap;
use tokio::task::JoinSet;
use tracing::{info, warn};
use weaver_domain::{
    AgentTask, AgentVariant, ContextSnippet, ControllerVerdict, CriticVerdict, Decision,
    DefenderVerdict, EvaluationPolicy, EvaluationVerdict, GeneratedCode, PipelinePhase,
    PromptTemplate, mean_score, parse_controller_response, parse_critic_response,
    parse_defender_response,
};

/// Verdict plus every agent task the evaluation ran
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    pub verdict: EvaluationVerdict,
    pub tasks: Vec<AgentTask>,
}

/// Use case for the dual-review evaluation
#[derive(Clone)]
pub struct EvaluateCodeUseCase {
    invoker: AgentInvoker,
    policy: EvaluationPolicy,
}

impl EvaluateCodeUseCase {
    pub fn new(invoker: AgentInvoker) -> Self {
        Self {
            invoker,
            policy: EvaluationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EvaluationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &EvaluationPolicy {
        &self.policy
    }

    pub async fn execute(
        &self,
        request_text: &str,
        code: &GeneratedCode,
        context: &[ContextSnippet],
        ctx: &RequestContext,
    ) -> Result<EvaluationRun, PipelineError> {
        check_cancelled(ctx)?;
        info!(
            "[{}] Evaluating {} file(s)",
            ctx.request_id,
            code.len()
        );
        ctx.progress.on_phase_start(PipelinePhase::Evaluation, 2);

        let (critic_task, defender_task) = self.review(request_text, code, context, ctx).await?;
        let mut notices = Vec::new();

        let critic = match critic_task.output_text().and_then(parse_critic_response) {
            Some(verdict) => verdict,
            None => {
                let cause = critic_task.error().unwrap_or("response had no score");
                notices.push(format!("CRITIC reviewer unavailable: {}", cause));
                CriticVerdict::unavailable(cause)
            }
        };
        let defender = match defender_task.output_text().and_then(parse_defender_response) {
            Some(verdict) => verdict,
            None => {
                let cause = defender_task.error().unwrap_or("response had no score");
                notices.push(format!("DEFENDER reviewer unavailable: {}", cause));
                DefenderVerdict::unavailable(cause)
            }
        };

        let mut tasks = vec![critic_task, defender_task];
        let decision = self.policy.decide(&critic, &defender);

        if !critic.available && !defender.available {
            warn!(
                "[{}] Both reviewers unavailable; accepting original code with zero confidence",
                ctx.request_id
            );
            notices.push("Both reviewers unavailable; code accepted unverified".to_string());
        }

        let controller = if decision == Decision::MergeFeedback {
            let (verdict, task) = self
                .merge(request_text, code, &critic, &defender, &mut notices, ctx)
                .await?;
            tasks.push(task);
            verdict
        } else {
            self.policy.settle(decision, &critic, &defender)?
        };

        info!(
            "[{}] Evaluation decision: {} (critic {:.1}, defender {:.1}, confidence {:.2})",
            ctx.request_id,
            controller.decision(),
            critic.score,
            defender.score,
            controller.confidence()
        );
        ctx.log(
            "evaluation_decided",
            json!({
                "decision": controller.decision(),
                "critic_score": critic.score,
                "defender_score": defender.score,
                "final_score": controller.final_score(),
                "confidence": controller.confidence(),
                "issues": controller.merged_issues().len(),
                "notices": notices,
            }),
        );

        let verdict = EvaluationVerdict::new(critic, defender, controller, code.clone(), notices);
        ctx.progress.on_evaluation(&verdict);
        ctx.progress.on_phase_complete(PipelinePhase::Evaluation);

        Ok(EvaluationRun { verdict, tasks })
    }

    /// Run CRITIC and DEFENDER concurrently and wait for both
    async fn review(
        &self,
        request_text: &str,
        code: &GeneratedCode,
        context: &[ContextSnippet],
        ctx: &RequestContext,
    ) -> Result<(AgentTask, AgentTask), PipelineError> {
        let mut join_set = JoinSet::new();
        let reviews = [
            (
                AgentVariant::Critic,
                PromptTemplate::critic_prompt(request_text, code, context),
            ),
            (
                AgentVariant::Defender,
                PromptTemplate::defender_prompt(request_text, code, context),
            ),
        ];
        for (variant, prompt) in reviews {
            let invoker = self.invoker.clone();
            let token = ctx.cancellation.clone();
            join_set.spawn(async move { invoker.invoke(AgentTask::new(variant, prompt), &token).await });
        }

        let finished = join_all_cancellable(join_set, &ctx.cancellation).await?;
        check_cancelled(ctx)?;

        let mut critic = None;
        let mut defender = None;
        for task in finished {
            ctx.record_task(PipelinePhase::Evaluation, &task);
            match task.variant {
                AgentVariant::Critic => critic = Some(task),
                _ => defender = Some(task),
            }
        }

        // A panicked reviewer task never reports back; treat it as failed.
        let missing = |variant: AgentVariant| {
            let mut task = AgentTask::new(variant, "");
            task.start();
            task.fail("reviewer task aborted", 0, 0);
            task
        };
        Ok((
            critic.unwrap_or_else(|| missing(AgentVariant::Critic)),
            defender.unwrap_or_else(|| missing(AgentVariant::Defender)),
        ))
    }

    /// Ask the controller to merge critic feedback into the code.
    ///
    /// Falls back to the original code and the mean reviewer score when the
    /// controller fails or returns no code.
    async fn merge(
        &self,
        request_text: &str,
        code: &GeneratedCode,
        critic: &CriticVerdict,
        defender: &DefenderVerdict,
        notices: &mut Vec<String>,
        ctx: &RequestContext,
    ) -> Result<(ControllerVerdict, AgentTask), PipelineError> {
        let task = AgentTask::new(
            AgentVariant::Controller,
            PromptTemplate::controller_prompt(request_text, code, critic, defender),
        );
        let task = self.invoker.invoke(task, &ctx.cancellation).await;
        check_cancelled(ctx)?;
        ctx.record_task(PipelinePhase::Evaluation, &task);

        let confidence = self.policy.confidence(critic, defender);
        let merged_issues = EvaluationPolicy::merged_issues(critic, defender);

        let verdict = match task.output_text().and_then(parse_controller_response) {
            Some(proposal) => {
                let priority_fixes = if proposal.priority_fixes.is_empty() {
                    EvaluationPolicy::priority_fixes(critic)
                } else {
                    proposal.priority_fixes
                };
                ControllerVerdict::new(
                    Decision::MergeFeedback,
                    proposal.reasoning,
                    proposal
                        .final_score
                        .unwrap_or_else(|| mean_score(critic, defender)),
                    confidence,
                    merged_issues,
                    priority_fixes,
                    Some(proposal.improved_code_by_file),
                )?
            }
            None => {
                let cause = task.error().unwrap_or("no improved code in response");
                warn!(
                    "[{}] Controller unavailable ({}); keeping original code",
                    ctx.request_id, cause
                );
                notices.push(format!("CONTROLLER unavailable: {}", cause));
                let original: BTreeMap<String, String> = code
                    .changes()
                    .iter()
                    .map(|c| (c.path.clone(), c.content.clone()))
                    .collect();
                ControllerVerdict::new(
                    Decision::MergeFeedback,
                    format!("Controller unavailable ({}); original code kept", cause),
                    mean_score(critic, defender),
                    confidence,
                    merged_issues,
                    EvaluationPolicy::priority_fixes(critic),
                    Some(original),
                )?
            }
        };

        Ok((verdict, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionParams;
    use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use weaver_domain::{CodeChange, CodeChoice, ModelConfig, Model, RequestId};

    // ==================== Test Mocks ====================

    /// Replies by system prompt, so concurrent reviewers get their own script
    struct RoleSession {
        model: Model,
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmSession for RoleSession {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn send(&self, _content: &str) -> Result<String, GatewayError> {
            self.reply
                .clone()
                .ok_or_else(|| GatewayError::RequestFailed("unavailable".to_string()))
        }
    }

    struct RoleGateway {
        critic: Option<&'static str>,
        defender: Option<&'static str>,
        controller: Option<&'static str>,
        controller_calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmGateway for RoleGateway {
        async fn create_session_with_system_prompt(
            &self,
            model: &Model,
            system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            let reply = if system_prompt == PromptTemplate::system_prompt(AgentVariant::Critic) {
                self.critic
            } else if system_prompt == PromptTemplate::system_prompt(AgentVariant::Defender) {
                self.defender
            } else {
                self.controller_calls.fetch_add(1, Ordering::SeqCst);
                self.controller
            };
            Ok(Box::new(RoleSession {
                model: model.clone(),
                reply: reply.map(str::to_string),
            }))
        }
    }

    fn evaluator(
        critic: Option<&'static str>,
        defender: Option<&'static str>,
        controller: Option<&'static str>,
    ) -> (EvaluateCodeUseCase, Arc<RoleGateway>) {
        let gateway = Arc::new(RoleGateway {
            critic,
            defender,
            controller,
            controller_calls: AtomicUsize::new(0),
        });
        let params = ExecutionParams::default()
            .with_max_retries(0)
            .with_agent_timeout(Duration::from_secs(5));
        let invoker = AgentInvoker::new(gateway.clone(), ModelConfig::default(), params);
        (EvaluateCodeUseCase::new(invoker), gateway)
    }

    fn code() -> GeneratedCode {
        GeneratedCode::new([CodeChange::new("src/db.rs", "fn query(sql: &str) {}")])
    }

    fn ctx() -> RequestContext {
        RequestContext::new(RequestId::new("eval"))
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_low_critic_with_high_issue_requests_revision() {
        let (evaluator, gateway) = evaluator(
            Some(r#"{"score": 2, "issues": [{"severity": "HIGH", "description": "SQL injection"}]}"#),
            Some(r#"{"score": 6, "feedback": "works"}"#),
            None,
        );
        let run = evaluator.execute("add query", &code(), &[], &ctx()).await.unwrap();

        assert_eq!(run.verdict.decision(), Decision::RequestRevision);
        assert!(run.verdict.controller().improved_code_by_file().is_none());
        assert_eq!(gateway.controller_calls.load(Ordering::SeqCst), 0);
        assert_eq!(run.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_high_critic_accepts_original() {
        let (evaluator, _) = evaluator(
            Some(r#"{"score": 8, "issues": []}"#),
            Some(r#"{"score": 8}"#),
            None,
        );
        let run = evaluator.execute("add query", &code(), &[], &ctx()).await.unwrap();

        assert_eq!(run.verdict.decision(), Decision::AcceptOriginal);
        assert_eq!(run.verdict.controller().confidence(), 1.0);
        assert_eq!(run.verdict.selected_code(CodeChoice::Improved), code());
    }

    #[tokio::test]
    async fn test_disagreement_merges_via_controller() {
        let (evaluator, gateway) = evaluator(
            Some(r#"{"score": 5, "issues": [{"severity": "MEDIUM", "description": "no bind params"}]}"#),
            Some(r#"{"score": 9}"#),
            Some(r#"{"reasoning": "bound params", "final_score": 7.5, "improved_code_by_file": {"src/db.rs": "fn query(sql: &str, args: &[&str]) {}"}}"#),
        );
        let run = evaluator.execute("add query", &code(), &[], &ctx()).await.unwrap();

        assert_eq!(run.verdict.decision(), Decision::MergeFeedback);
        assert_eq!(run.verdict.controller().final_score(), 7.5);
        assert_eq!(gateway.controller_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            run.verdict
                .selected_code(CodeChoice::Improved)
                .get("src/db.rs"),
            Some("fn query(sql: &str, args: &[&str]) {}")
        );
        assert_eq!(run.verdict.original(), &code());
        assert_eq!(run.tasks.len(), 3);
    }

    #[tokio::test]
    async fn test_controller_failure_keeps_original() {
        let (evaluator, _) = evaluator(
            Some(r#"{"score": 5}"#),
            Some(r#"{"score": 6}"#),
            None,
        );
        let run = evaluator.execute("add query", &code(), &[], &ctx()).await.unwrap();

        assert_eq!(run.verdict.decision(), Decision::MergeFeedback);
        assert_eq!(run.verdict.controller().final_score(), 5.5);
        assert_eq!(run.verdict.selected_code(CodeChoice::Improved), code());
        assert!(run.verdict.notices().iter().any(|n| n.starts_with("CONTROLLER unavailable")));
    }

    #[tokio::test]
    async fn test_both_reviewers_down_accepts_with_zero_confidence() {
        let (evaluator, _) = evaluator(None, None, None);
        let run = evaluator.execute("add query", &code(), &[], &ctx()).await.unwrap();

        assert_eq!(run.verdict.decision(), Decision::AcceptOriginal);
        assert_eq!(run.verdict.controller().confidence(), 0.0);
        assert!(!run.verdict.critic().available);
        assert!(!run.verdict.defender().available);
        assert_eq!(run.verdict.notices().len(), 3);
    }

    #[tokio::test]
    async fn test_one_reviewer_down_is_neutral() {
        let (evaluator, _) = evaluator(
            None,
            Some(r#"{"score": 8}"#),
            Some(r#"{"reasoning": "ok", "improved_code_by_file": {}}"#),
        );
        let run = evaluator.execute("add query", &code(), &[], &ctx()).await.unwrap();

        assert_eq!(run.verdict.critic().score, 5.0);
        assert_ne!(run.verdict.decision(), Decision::RequestRevision);
        assert_eq!(run.verdict.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_evaluation() {
        let (evaluator, _) = evaluator(Some(r#"{"score": 8}"#), Some(r#"{"score": 8}"#), None);
        let ctx = ctx();
        ctx.cancellation.cancel();
        let result = evaluator.execute("add query", &code(), &[], &ctx).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
