//! # SmartShop Sync
//!
//! Reconciliation engine between the local store and the remote store.
//!
//! The engine implements a **pull-then-push** model:
//! 1. Pull every remote document and overwrite the pulled set locally
//!    (remote wins for what it holds)
//! 2. Push every dirty local row: upserts to the remote, deletes followed
//!    by local purge
//!
//! ## Key invariants
//!
//! - Pull never removes rows the remote does not mention, so offline
//!   creations survive any pull
//! - A soft-deleted, unpushed row is only physically removed after the
//!   remote delete succeeds
//! - One row's push failure never aborts the rest of the push set;
//!   failures are recorded per row for the threshold-based retry policy
//! - A local mutation landing while a push is in flight wins: completion
//!   of the stale push cannot mark the row clean

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;

pub use config::SyncConfig;
pub use engine::{PushDisposition, PushOutcome, SyncCycleResult, SyncEngine, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
