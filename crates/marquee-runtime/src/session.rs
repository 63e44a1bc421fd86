//! Per-session orchestration state.
//!
//! One [`OrchestrationState`] per user request. The orchestrator is the
//! only writer; terminal states (`Complete`, `Error`) never mutate again —
//! `complete` and `fail` are no-ops once the session has ended.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_capabilities::SessionScope;
use marquee_core::frame::Frame;
use marquee_core::response::FinalResponse;
use marquee_core::task::TaskResult;

/// Session lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The loop is running.
    Processing,
    /// Ended with a final response.
    Complete,
    /// Ended with a diagnostic.
    Error,
}

/// Mutable state of one orchestration session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestrationState {
    /// Session id (UUID v7, time-ordered).
    pub session_id: String,
    /// Data-isolation scope for every lookup and query in this session.
    pub tenant_id: String,
    /// Requesting user.
    pub user_id: String,
    /// The original request text.
    pub query: String,
    /// Active frame, set by the extraction step.
    pub frame: Option<Frame>,
    /// Append-only task log, in dispatch order.
    pub completed_tasks: Vec<TaskResult>,
    /// Loop iteration counter.
    pub loop_count: u32,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Final response, present iff status is `Complete`.
    pub final_response: Option<FinalResponse>,
    /// Diagnostic, present iff status is `Error`.
    pub error: Option<String>,
}

impl OrchestrationState {
    /// Start a fresh session for `query`.
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            session_id: Uuid::now_v7().to_string(),
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            query: query.into(),
            frame: None,
            completed_tasks: Vec::new(),
            loop_count: 0,
            status: SessionStatus::Processing,
            final_response: None,
            error: None,
        }
    }

    /// Identity scope handed to capability invocations.
    pub fn scope(&self) -> SessionScope {
        SessionScope {
            session_id: self.session_id.clone(),
            tenant_id: self.tenant_id.clone(),
            user_id: self.user_id.clone(),
        }
    }

    /// True once the session has ended, either way.
    pub fn is_terminal(&self) -> bool {
        self.status != SessionStatus::Processing
    }

    /// Sequence number for the next dispatched task (1-based).
    pub fn next_sequence(&self) -> usize {
        self.completed_tasks.len() + 1
    }

    /// End the session with a final response. No-op if already terminal.
    pub fn complete(&mut self, response: FinalResponse) {
        if self.is_terminal() {
            return;
        }
        self.status = SessionStatus::Complete;
        self.final_response = Some(response);
    }

    /// End the session with an error diagnostic. No-op if already terminal.
    pub fn fail(&mut self, diagnostic: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.status = SessionStatus::Error;
        self.error = Some(diagnostic.into());
    }
}
