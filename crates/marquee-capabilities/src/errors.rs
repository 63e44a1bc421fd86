//! Capability and query-service error types.

use std::time::Duration;

use thiserror::Error;

/// Errors a capability can produce. All of these are absorbed into a
/// failed `TaskResult` at the dispatch boundary — they never crash the
/// orchestration loop.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Task inputs failed validation against the declared contract.
    #[error("invalid inputs: {0}")]
    InvalidInputs(String),

    /// The capability ran but could not complete its work.
    #[error("execution failed: {0}")]
    Execution(String),

    /// An injected collaborator (translator, generator) failed.
    #[error("collaborator failed: {0}")]
    Collaborator(String),

    /// Underlying query-service failure.
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Errors from the analytical query service.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The service rejected or failed the request.
    #[error("query service error: {0}")]
    Service(String),

    /// Transport-level failure reaching the service.
    #[error("query transport error: {0}")]
    Transport(String),

    /// The request exceeded its bounded timeout.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// The service reply could not be decoded.
    #[error("malformed query response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(Duration::from_secs(0))
        } else {
            Self::Transport(e.to_string())
        }
    }
}
