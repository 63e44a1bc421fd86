//! Tasks and the append-only task result log.
//!
//! A [`Task`] is created by the orchestrator per loop iteration and never
//! mutated. A [`TaskResult`] records the outcome — success or failure —
//! and is appended to the session log unconditionally, so the planner can
//! reason about failures on the next iteration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single unit of work dispatched to a capability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Monotonically assigned id: `t1`, `t2`, … in dispatch order.
    pub id: String,
    /// Name of the capability to execute.
    pub capability: String,
    /// Planner-provided inputs.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with the given sequence number (1-based).
    pub fn new(sequence: usize, capability: impl Into<String>, inputs: Map<String, Value>) -> Self {
        Self {
            id: format!("t{sequence}"),
            capability: capability.into(),
            inputs,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of one task. Append-only: never mutated or removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Id of the task this result answers.
    pub task_id: String,
    /// Capability that produced it.
    pub capability: String,
    /// The inputs the task carried.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Result payload (empty object on failure).
    pub payload: Value,
    /// Whether the capability succeeded.
    pub success: bool,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One-line summary shown in planner context.
    pub summary: String,
    /// Fields the response composer may surface to the user.
    #[serde(default)]
    pub response_context: Map<String, Value>,
    /// Completion timestamp.
    pub timestamp: DateTime<Utc>,
}

impl TaskResult {
    /// Build a successful result for `task`.
    pub fn success(task: &Task, payload: Value, summary: impl Into<String>) -> Self {
        Self {
            task_id: task.id.clone(),
            capability: task.capability.clone(),
            inputs: task.inputs.clone(),
            payload,
            success: true,
            error: None,
            summary: summary.into(),
            response_context: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Build a failed result for `task`. The error text doubles as the
    /// summary so it is visible in planner context.
    pub fn failure(task: &Task, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            task_id: task.id.clone(),
            capability: task.capability.clone(),
            inputs: task.inputs.clone(),
            payload: Value::Object(Map::new()),
            success: false,
            summary: error.clone(),
            error: Some(error),
            response_context: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach response-context fields.
    #[must_use]
    pub fn with_response_context(mut self, context: Map<String, Value>) -> Self {
        self.response_context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_ids_follow_dispatch_sequence() {
        let t1 = Task::new(1, "fetch_data", Map::new());
        let t2 = Task::new(2, "analyze", Map::new());
        assert_eq!(t1.id, "t1");
        assert_eq!(t2.id, "t2");
    }

    #[test]
    fn failure_carries_error_as_summary() {
        let task = Task::new(3, "ghost", Map::new());
        let result = TaskResult::failure(&task, "unknown capability 'ghost'");
        assert_eq!(result.task_id, "t3");
        assert!(!result.success);
        assert_eq!(result.summary, "unknown capability 'ghost'");
        assert_eq!(result.error.as_deref(), Some("unknown capability 'ghost'"));
        assert_eq!(result.payload, json!({}));
    }

    #[test]
    fn success_keeps_inputs_for_the_log() {
        let mut inputs = Map::new();
        let _ = inputs.insert("measures".into(), json!(["revenue"]));
        let task = Task::new(1, "fetch_data", inputs.clone());
        let result = TaskResult::success(&task, json!({"rows": 2}), "2 rows");
        assert!(result.success);
        assert_eq!(result.inputs, inputs);
        assert!(result.error.is_none());
    }
}
