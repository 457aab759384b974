//! Error types for remote operations.

use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors a remote call can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The call failed for a reason worth retrying later (network down,
    /// timeout, throttling).
    #[error("transient remote error: {0}")]
    Transient(String),

    /// The addressed document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The store rejected the request and will keep rejecting it
    /// (malformed document, permission denied).
    #[error("remote rejected request: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// Whether a later retry of the same call can be expected to succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(RemoteError::Transient("connection reset".into()).is_retryable());
        assert!(!RemoteError::NotFound("doc-1".into()).is_retryable());
        assert!(!RemoteError::Rejected("schema violation".into()).is_retryable());
    }
}
