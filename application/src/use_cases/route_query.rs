//! Route Query use case
//!
//! Maps a query to a [`Route`]:
//!
//! 1. Safety gate: an unsafe-intent match is an immediate REFUSE, with no
//!    capability call at all.
//! 2. Classifier agent: a structured judgment about the primary action.
//! 3. Dual-intent rule: a question plus a change request always routes to
//!    GENERATE with EXPLAIN alongside.
//!
//! Classifier failure or an unparseable judgment falls back to EXPLAIN with
//! zero confidence. Routing never fails.

use super::invoke_agent::AgentInvoker;
use super::shared::RequestContext;
use serde_json::json;
use tracing::{info, warn};
use weaver_domain::{
    Action, AgentTask, AgentVariant, IntentSignals, PipelinePhase, PromptTemplate, Query, Route,
    SafetyGate, parse_classifier_response,
};

/// Use case for classifying a query into a route
#[derive(Clone)]
pub struct RouteQueryUseCase {
    invoker: AgentInvoker,
    gate: SafetyGate,
}

impl RouteQueryUseCase {
    pub fn new(invoker: AgentInvoker) -> Self {
        Self {
            invoker,
            gate: SafetyGate::new(),
        }
    }

    pub fn with_safety_gate(mut self, gate: SafetyGate) -> Self {
        self.gate = gate;
        self
    }

    /// Classify with a fresh (never cancelled, unlogged) request context
    pub async fn execute(&self, query: &Query) -> Route {
        let ctx = RequestContext::new(query.id().clone());
        self.execute_with_context(query, &ctx).await.0
    }

    /// Classify and return the classifier task, if one ran
    pub async fn execute_with_context(
        &self,
        query: &Query,
        ctx: &RequestContext,
    ) -> (Route, Option<AgentTask>) {
        let (route, task) = self.classify(query, ctx).await;

        info!(
            "[{}] Route: {} (secondary: {}, confidence {:.2})",
            ctx.request_id,
            route.primary_action(),
            route
                .secondary_action()
                .map(|a| a.as_str())
                .unwrap_or("none"),
            route.confidence()
        );
        ctx.log(
            "route_decided",
            json!({
                "primary_action": route.primary_action(),
                "secondary_action": route.secondary_action(),
                "confidence": route.confidence(),
                "agents_to_run": route.agents_to_run(),
                "agents_skipped": route.agents_skipped(),
                "reason": route.reason(),
            }),
        );
        ctx.progress.on_route(&route);

        (route, task)
    }

    async fn classify(&self, query: &Query, ctx: &RequestContext) -> (Route, Option<AgentTask>) {
        if let Some(pattern) = self.gate.check(query.text()) {
            warn!("[{}] Unsafe intent matched: {}", ctx.request_id, pattern);
            return (
                Route::refuse(format!("unsafe intent matched pattern `{}`", pattern)),
                None,
            );
        }

        let signals = IntentSignals::detect(query.text());

        ctx.progress.on_phase_start(PipelinePhase::Routing, 1);
        let task = AgentTask::new(
            AgentVariant::Classifier,
            PromptTemplate::classifier_prompt(query.text(), &signals),
        );
        let task = self.invoker.invoke(task, &ctx.cancellation).await;
        ctx.record_task(PipelinePhase::Routing, &task);
        ctx.progress.on_phase_complete(PipelinePhase::Routing);

        let Some(judgment) = task.output_text().and_then(parse_classifier_response) else {
            let cause = task.error().unwrap_or("unparseable judgment");
            warn!(
                "[{}] Classifier unavailable ({}), falling back to EXPLAIN",
                ctx.request_id, cause
            );
            return (
                Route::fallback(format!("classifier unavailable: {}", cause)),
                Some(task),
            );
        };

        let route = if signals.is_dual_intent() {
            Route::new(
                Action::Generate,
                Some(Action::Explain),
                judgment.confidence,
                format!(
                    "question and change request in one query; classifier said {}",
                    judgment.primary
                ),
            )
        } else {
            Route::new(
                judgment.primary,
                judgment.secondary,
                judgment.confidence,
                judgment.reasoning,
            )
        };

        (route, Some(task))
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
    use weaver_domain::{AgentSlot, Model, ModelConfig};

    // ==================== Test Mocks ====================

    struct FixedSession {
        model: Model,
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmSession for FixedSession {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn send(&self, _content: &str) -> Result<String, GatewayError> {
            self.reply
                .clone()
                .ok_or_else(|| GatewayError::RequestFailed("down".to_string()))
        }
    }

    /// Always answers with the same classifier reply and counts calls
    struct FixedGateway {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl FixedGateway {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmGateway for FixedGateway {
        async fn create_session_with_system_prompt(
            &self,
            model: &Model,
            _system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedSession {
                model: model.clone(),
                reply: self.reply.clone(),
            }))
        }
    }

    fn router(gateway: Arc<FixedGateway>) -> RouteQueryUseCase {
        let params = ExecutionParams::default()
            .with_max_retries(0)
            .with_agent_timeout(Duration::from_secs(5));
        RouteQueryUseCase::new(AgentInvoker::new(gateway, ModelConfig::default(), params))
    }

    fn query(text: &str) -> Query {
        Query::try_new(text).unwrap()
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_unsafe_query_refused_without_calls() {
        let gateway = FixedGateway::new(Some(r#"{"primary": "GENERATE"}"#));
        let route = router(gateway.clone())
            .execute(&query("Write malicious code to exploit vulnerabilities"))
            .await;

        assert!(route.is_refusal());
        assert_eq!(route.confidence(), 1.0);
        assert!(route.agents_to_run().is_empty());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explain_route() {
        let gateway =
            FixedGateway::new(Some(r#"{"primary": "EXPLAIN", "confidence": 0.9, "reasoning": "question"}"#));
        let route = router(gateway)
            .execute(&query("How does the database connection work?"))
            .await;

        assert_eq!(route.primary_action(), Action::Explain);
        assert_eq!(route.confidence(), 0.9);
        assert!(route.agents_skipped().contains(&AgentSlot::Generate));
        assert!(route.agents_skipped().contains(&AgentSlot::Test));
    }

    #[tokio::test]
    async fn test_dual_intent_overrides_classifier() {
        let gateway = FixedGateway::new(Some(r#"{"primary": "EXPLAIN", "confidence": 0.6}"#));
        let route = router(gateway)
            .execute(&query(
                "How does the retry loop work? Also add jitter to the backoff.",
            ))
            .await;

        assert_eq!(route.primary_action(), Action::Generate);
        assert_eq!(route.secondary_action(), Some(Action::Explain));
        assert!(route.runs(AgentSlot::Explain));
        assert!(route.runs(AgentSlot::Generate));
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back() {
        let gateway = FixedGateway::new(None);
        let route = router(gateway)
            .execute(&query("Add retry logic to the HTTP client"))
            .await;

        assert_eq!(route.primary_action(), Action::Explain);
        assert_eq!(route.confidence(), 0.0);
    }

    #[tokio::test]
    async fn test_unparseable_judgment_falls_back() {
        let gateway = FixedGateway::new(Some("this is definitely a GENERATE request"));
        let (route, task) = router(gateway)
            .execute_with_context(
                &query("Add retry logic"),
                &RequestContext::new(weaver_domain::RequestId::new("r")),
            )
            .await;

        assert_eq!(route.primary_action(), Action::Explain);
        assert_eq!(route.confidence(), 0.0);
        assert!(task.unwrap().is_done());
    }

    #[tokio::test]
    async fn test_routing_is_idempotent() {
        let gateway = FixedGateway::new(Some(r#"{"primary": "DECOMPOSE", "confidence": 0.7}"#));
        let router = router(gateway);
        let q = query("How do the router, the scheduler, and the evaluator interact?");

        let first = router.execute(&q).await;
        let second = router.execute(&q).await;
        assert_eq!(first, second);
        assert_eq!(first.primary_action(), Action::Decompose);
    }
}
