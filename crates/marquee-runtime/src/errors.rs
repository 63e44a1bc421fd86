//! Runtime and planner error types.

use thiserror::Error;

use marquee_resolver::ResolverError;

/// Errors that end a session in the ERROR state.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The orchestration loop ran past its iteration cap.
    #[error("orchestration loop limit of {limit} iterations exceeded")]
    LoopLimitExceeded {
        /// The configured cap.
        limit: u32,
    },

    /// The entity datastore could not be reached.
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// Frame extraction failed before orchestration started.
    #[error("frame extraction failed: {0}")]
    Extraction(String),
}

/// Errors from the planner seam.
///
/// `Malformed` is recoverable: the orchestrator substitutes a safe
/// default decision and keeps going. `Transport` is not — a planner
/// that cannot be reached ends the session.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The planner endpoint could not be reached or replied non-2xx.
    #[error("planner transport error: {0}")]
    Transport(String),

    /// The planner replied, but not with a usable decision.
    #[error("malformed planner reply: {0}")]
    Malformed(String),
}
