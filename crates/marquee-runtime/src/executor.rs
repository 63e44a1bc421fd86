//! The dispatch boundary between the loop and capabilities.
//!
//! Every way a dispatch can go wrong — unknown capability, input
//! validation, execution error, timeout — is absorbed into a failed
//! [`TaskResult`] here. Nothing a capability does can escalate past this
//! boundary and crash the loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{info, instrument, warn};

use marquee_capabilities::{Catalog, SessionScope};
use marquee_core::task::{Task, TaskResult};

/// Dispatches tasks to catalog capabilities.
pub struct TaskExecutor {
    catalog: Arc<Catalog>,
    timeout: Duration,
}

impl TaskExecutor {
    /// Create an executor over `catalog`. `timeout` bounds each execution.
    pub fn new(catalog: Arc<Catalog>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    /// The catalog this executor dispatches against.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Run `task` to a [`TaskResult`]. Infallible by design: failures are
    /// recorded results, not errors.
    #[instrument(skip(self, task, scope), fields(task_id = %task.id, capability = %task.capability))]
    pub async fn dispatch(&self, task: &Task, scope: &SessionScope) -> TaskResult {
        let Some(capability) = self.catalog.get(&task.capability) else {
            warn!("unknown capability requested");
            counter!("capability_executions_total", "outcome" => "unknown").increment(1);
            return TaskResult::failure(
                task,
                format!(
                    "unknown capability '{}'; available: {}",
                    task.capability,
                    self.catalog.names().join(", ")
                ),
            );
        };

        let inputs = match capability.build_inputs(task, scope) {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!(error = %e, "input validation failed");
                counter!("capability_executions_total", "outcome" => "invalid").increment(1);
                return TaskResult::failure(task, e.to_string());
            }
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, capability.execute(inputs)).await;
        let elapsed = started.elapsed();
        histogram!("capability_execution_duration_seconds", "capability" => task.capability.clone())
            .record(elapsed.as_secs_f64());

        match outcome {
            Ok(Ok(payload)) => {
                counter!("capability_executions_total", "outcome" => "ok").increment(1);
                info!(duration_ms = elapsed.as_millis() as u64, "task succeeded");
                let summary = capability.summarize(&payload);
                let context = capability.response_context(&payload);
                TaskResult::success(task, payload, summary).with_response_context(context)
            }
            Ok(Err(e)) => {
                counter!("capability_executions_total", "outcome" => "error").increment(1);
                warn!(error = %e, "task failed");
                TaskResult::failure(task, e.to_string())
            }
            Err(_) => {
                counter!("capability_executions_total", "outcome" => "timeout").increment(1);
                warn!(timeout = ?self.timeout, "task timed out");
                TaskResult::failure(
                    task,
                    format!(
                        "capability '{}' timed out after {:?}",
                        task.capability, self.timeout
                    ),
                )
            }
        }
    }
}
