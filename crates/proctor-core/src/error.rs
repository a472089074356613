//! Engine error taxonomy.
//!
//! Defined in `proctor-core` so both the engine and the collaborator
//! implementations speak the same error language, and callers can classify
//! failures for retry decisions without string matching.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the attempt engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or rejected input. Not retriable; the caller must fix the
    /// request.
    #[error("validation: {0}")]
    Validation(String),

    /// A referenced resource does not exist or is not owned by the expected
    /// parent.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// The one-open-attempt constraint was violated, or a concurrent writer
    /// won a race. Retriable by re-resolving the attempt.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A collaborator call exceeded its bounded deadline. Retriable with
    /// backoff.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// Anything else. Propagated opaquely, never swallowed.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Shorthand for a missing resource.
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        EngineError::NotFound { kind, id }
    }

    /// Returns `true` if the caller may retry the operation as-is.
    ///
    /// Conflicts resolve by re-reading; timeouts by backing off. Validation
    /// and not-found failures are permanent for the same input.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::Conflict(_) | EngineError::Timeout(_))
    }
}
