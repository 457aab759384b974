//! # SmartShop Remote
//!
//! Document-collection contract over the network-backed store.
//!
//! The [`RemoteStore`] trait abstracts whatever document database the
//! deployment uses; the contract is id-addressed CRUD plus "get all in
//! collection". There is no caching and no retry here — every call may fail
//! with a transient error, which propagates uninterpreted. Retry policy
//! lives in the sync engine.
//!
//! [`MemoryRemoteStore`] is the in-process implementation used by tests and
//! previews; it supports fault injection so sync failure paths can be
//! exercised deterministically.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;

pub use error::{RemoteError, RemoteResult};
pub use memory::{MemoryRemoteStore, RemoteOp};
pub use store::RemoteStore;
