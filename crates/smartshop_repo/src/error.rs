//! Error type for the repository facade.

use smartshop_model::ValidationError;
use smartshop_remote::RemoteError;
use smartshop_store::StoreError;
use smartshop_sync::SyncError;
use thiserror::Error;

/// Errors surfaced by [`Repository`](crate::Repository) operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// No record exists with the given id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The record failed validation before the write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The remote store failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The sync engine failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Convenience alias for repository results.
pub type RepoResult<T> = Result<T, RepoError>;
