//! The error taxonomy the facade exposes to transport adapters.

use thiserror::Error;

/// Abstract error kinds raised by the service facade.
///
/// The HTTP boundary maps each kind to a status code; the core never retries
/// any of them. Snapshot I/O and per-record parse faults are deliberately not
/// here: they are logged and absorbed inside the snapshot engine, never
/// surfaced to clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required field is absent, whitespace-only where disallowed, or
    /// structurally malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// The referenced queue or result does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request was well-formed but a required precondition on the
    /// referenced state does not hold.
    #[error("{0}")]
    PreconditionFailed(String),
}

impl ServiceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }
}
