//! Resolver error types.

use thiserror::Error;

/// Errors from the entity resolution engine.
///
/// An empty candidate list is a valid outcome, never an error. These
/// variants cover the datastore itself failing — which the orchestrator
/// treats as terminal for the session.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The entity store could not be reached or a connection could not
    /// be acquired from the pool.
    #[error("entity store unavailable: {0}")]
    Unavailable(String),

    /// A query against the entity store failed.
    #[error("entity store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

impl From<r2d2::Error> for ResolverError {
    fn from(e: r2d2::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ResolverError>;
