//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the local store.
///
/// Store errors are fatal to the operation that hit them and propagate to
/// the caller; the in-memory table is rolled back first, so a failed write
/// never leaves the table and the snapshot disagreeing.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error from the snapshot backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot could not be encoded.
    #[error("snapshot encode failed: {0}")]
    Encode(String),

    /// The snapshot on disk could not be decoded.
    #[error("snapshot corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store's file lock.
    #[error("store is locked by another process")]
    Locked,
}
