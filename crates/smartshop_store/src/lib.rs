//! # SmartShop Store
//!
//! Durable, queryable local table of [`LocalRecord`] keyed by id.
//!
//! The store is the single source of truth for the UI. It provides:
//! - CRUD with soft-delete lifecycle and sync bookkeeping
//! - DAO-style queries (by owner, by category, substring search)
//! - Aggregate statistics (stock value, low/out-of-stock counts, rollups)
//! - A change feed plus [`LiveQuery`] handles for reactive result sets
//! - Snapshot persistence behind the [`SnapshotBackend`] trait
//!
//! Writes are serialized through a single table lock; a write only becomes
//! visible (and its change event only fires) after the snapshot has been
//! persisted.
//!
//! [`LocalRecord`]: smartshop_model::LocalRecord

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod change_feed;
mod error;
mod live;
mod stats;
mod store;

pub use backend::{FileBackend, MemoryBackend, SnapshotBackend};
pub use change_feed::{ChangeEvent, ChangeKind};
pub use error::{StoreError, StoreResult};
pub use live::LiveQuery;
pub use stats::{CategoryStat, InventoryStats, LOW_STOCK_THRESHOLD};
pub use store::{LocalStore, PERMANENT_ERROR_TAG};
