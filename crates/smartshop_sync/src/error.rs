//! Error types for the sync engine.

use smartshop_remote::RemoteError;
use smartshop_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can abort a sync operation.
///
/// Per-record remote failures inside `push_unsynced` are recorded into the
/// row's bookkeeping instead of being raised; only failures of the
/// operation as a whole (a failed pull, a local store failure) surface as
/// `SyncError`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local store failed; fatal to the operation.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// A remote call failed in a position where it aborts the operation.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A sync cycle is already running.
    #[error("sync already in progress")]
    AlreadyRunning,
}
