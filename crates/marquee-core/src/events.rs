//! Lifecycle events for observability.
//!
//! Structured trace entries broadcast while a session runs. Useful for
//! debugging and tests; correctness never depends on anyone listening.

use serde::Serialize;
use serde_json::Value;

use crate::decision::Decision;

/// High-level session lifecycle events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarqueeEvent {
    /// All entity mentions in the active frame have resolutions.
    FrameResolved {
        /// Session the frame belongs to.
        session_id: String,
        /// Frame id.
        frame_id: String,
        /// Number of entity mentions resolved.
        entity_count: usize,
    },
    /// The planner returned a decision for this iteration.
    DecisionMade {
        /// Session id.
        session_id: String,
        /// Loop iteration the decision was made on (1-based).
        iteration: u32,
        /// The decision itself.
        decision: Decision,
    },
    /// A task finished (success or failure) and was appended to the log.
    TaskCompleted {
        /// Session id.
        session_id: String,
        /// Task id (`t1`, `t2`, …).
        task_id: String,
        /// Capability that ran.
        capability: String,
        /// Whether it succeeded.
        success: bool,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
    },
    /// The session reached a terminal state.
    SessionCompleted {
        /// Session id.
        session_id: String,
        /// Terminal status: `complete` or `error`.
        status: String,
        /// Diagnostic reason for error sessions.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Number of completed tasks in the log.
        task_count: usize,
        /// Extra detail, if any.
        #[serde(skip_serializing_if = "Value::is_null")]
        detail: Value,
    },
}

impl MarqueeEvent {
    /// Event type tag, for filtering in tests and traces.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FrameResolved { .. } => "frame_resolved",
            Self::DecisionMade { .. } => "decision_made",
            Self::TaskCompleted { .. } => "task_completed",
            Self::SessionCompleted { .. } => "session_completed",
        }
    }
}
