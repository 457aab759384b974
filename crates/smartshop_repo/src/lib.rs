//! # SmartShop Repository
//!
//! The application-facing facade over the SmartShop sync core. It ties
//! the local store, the remote store and the sync engine together into
//! one local-first surface:
//!
//! - Writes validate, land locally at once, and return; a background
//!   worker thread pushes them to the remote afterwards
//! - Reads are served from the local store and work fully offline
//! - Deletes are soft locally and become physical only after the remote
//!   confirms
//!
//! ```no_run
//! use smartshop_model::Record;
//! use smartshop_remote::MemoryRemoteStore;
//! use smartshop_repo::{FixedIdentity, Repository};
//! use smartshop_store::LocalStore;
//! use smartshop_sync::SyncConfig;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), smartshop_repo::RepoError> {
//! let repo = Repository::new(
//!     Arc::new(LocalStore::in_memory()),
//!     Arc::new(MemoryRemoteStore::new()),
//!     Arc::new(FixedIdentity::new("user-1")),
//!     SyncConfig::new(),
//! );
//!
//! let created = repo.create(Record::named("Espresso beans"))?;
//! assert!(repo.get_by_id(&created.id)?.is_some());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod identity;
mod repository;
mod worker;

pub use error::{RepoError, RepoResult};
pub use identity::{FixedIdentity, IdentityProvider, ANONYMOUS_OWNER};
pub use repository::Repository;
pub use worker::PushWorker;
