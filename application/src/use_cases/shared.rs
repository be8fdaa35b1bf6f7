//! Shared utilities for use cases.
//!
//! Contains the per-request context, cancellation checking, and the
//! cancellable barrier every parallel phase closes with.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{NoProgress, PipelineProgressNotifier};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use weaver_domain::{AgentTask, PipelinePhase, RequestId, TaskStatus};

/// The request was cancelled; partial results were discarded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Per-request state threaded through every use case.
///
/// Nothing here is global: each request gets its own id, cancellation
/// token, progress sink and transcript logger.
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub cancellation: CancellationToken,
    pub progress: Arc<dyn PipelineProgressNotifier>,
    pub logger: Arc<dyn ConversationLogger>,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            cancellation: CancellationToken::new(),
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn PipelineProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Write a transcript event tagged with this request's id.
    pub fn log(&self, event_type: &'static str, mut payload: Value) {
        if let Value::Object(map) = &mut payload {
            map.insert(
                "request_id".to_string(),
                Value::String(self.request_id.to_string()),
            );
        }
        self.logger.log(ConversationEvent::new(event_type, payload));
    }

    /// Report a finished agent task to progress and the transcript.
    pub fn record_task(&self, phase: PipelinePhase, task: &AgentTask) {
        self.progress.on_task_complete(phase, task);
        match task.status() {
            TaskStatus::Done => {
                debug!(
                    "[{}] {} done in {}ms ({} attempt(s))",
                    self.request_id,
                    task.label,
                    task.elapsed_ms(),
                    task.attempts()
                );
                self.log(
                    "agent_completed",
                    json!({
                        "phase": phase.as_str(),
                        "agent": task.label,
                        "variant": task.variant.as_str(),
                        "model": task.output().map(|o| o.model.to_string()),
                        "attempts": task.attempts(),
                        "elapsed_ms": task.elapsed_ms(),
                        "bytes": task.output_text().map(str::len).unwrap_or(0),
                    }),
                );
            }
            _ => {
                warn!(
                    "[{}] {} failed: {}",
                    self.request_id,
                    task.label,
                    task.error().unwrap_or("unknown error")
                );
                self.log(
                    "agent_failed",
                    json!({
                        "phase": phase.as_str(),
                        "agent": task.label,
                        "variant": task.variant.as_str(),
                        "status": task.status().as_str(),
                        "error": task.error(),
                        "attempts": task.attempts(),
                        "elapsed_ms": task.elapsed_ms(),
                    }),
                );
            }
        }
    }

    /// Report a skipped phase to progress and the transcript.
    pub fn record_skip(&self, phase: PipelinePhase, reason: &str) {
        debug!("[{}] {} skipped: {}", self.request_id, phase, reason);
        self.progress.on_phase_skipped(phase, reason);
        self.log(
            "phase_skipped",
            json!({ "phase": phase.as_str(), "reason": reason }),
        );
    }
}

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(ctx: &RequestContext) -> Result<(), Cancelled> {
    if ctx.is_cancelled() {
        return Err(Cancelled);
    }
    Ok(())
}

/// Barrier over a parallel phase.
///
/// Waits for every spawned task, or aborts all of them as soon as the
/// token is cancelled. Results come back in completion order.
pub(crate) async fn join_all_cancellable<T: 'static>(
    mut join_set: JoinSet<T>,
    token: &CancellationToken,
) -> Result<Vec<T>, Cancelled> {
    let mut results = Vec::with_capacity(join_set.len());
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                join_set.abort_all();
                return Err(Cancelled);
            }
            next = join_set.join_next() => next,
        };

        let Some(next) = next else {
            break;
        };

        match next {
            Ok(value) => results.push(value),
            Err(e) => warn!("Task join error: {}", e),
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingLogger {
        events: Mutex<Vec<(&'static str, Value)>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.event_type, event.payload));
        }
    }

    #[test]
    fn test_log_adds_request_id() {
        let logger = Arc::new(RecordingLogger {
            events: Mutex::new(Vec::new()),
        });
        let ctx = RequestContext::new(RequestId::new("req-1")).with_logger(logger.clone());
        ctx.record_skip(PipelinePhase::Refinement, "revision requested");

        let events = logger.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "phase_skipped");
        assert_eq!(events[0].1["request_id"], "req-1");
        assert_eq!(events[0].1["phase"], "refinement");
    }

    #[test]
    fn test_check_cancelled() {
        let ctx = RequestContext::new(RequestId::new("req"));
        assert!(check_cancelled(&ctx).is_ok());
        ctx.cancellation.cancel();
        assert_eq!(check_cancelled(&ctx), Err(Cancelled));
    }

    #[tokio::test]
    async fn test_join_all_collects() {
        let mut join_set = JoinSet::new();
        for i in 0..3 {
            join_set.spawn(async move { i * 2 });
        }
        let mut results = join_all_cancellable(join_set, &CancellationToken::new())
            .await
            .unwrap();
        results.sort();
        assert_eq!(results, vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_join_all_aborts_on_cancel() {
        let token = CancellationToken::new();
        let mut join_set = JoinSet::new();
        join_set.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        assert_eq!(join_all_cancellable(join_set, &token).await, Err(Cancelled));
    }
}
