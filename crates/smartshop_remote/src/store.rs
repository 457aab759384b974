//! Remote store trait definition.

use crate::error::RemoteResult;
use smartshop_model::Record;

/// A document collection addressable by id.
///
/// Implementations talk to the actual transport; durability and
/// availability are the remote store's concern. The contract is
/// deliberately narrow:
///
/// - no local caching
/// - no retry; transient failures propagate uninterpreted
/// - `add` assigns and returns the document id; the id in the passed
///   record is ignored
pub trait RemoteStore: Send + Sync {
    /// Fetches one document. `Ok(None)` means the id is absent (as opposed
    /// to the call failing).
    fn get(&self, id: &str) -> RemoteResult<Option<Record>>;

    /// Fetches every document in the collection.
    fn get_all(&self) -> RemoteResult<Vec<Record>>;

    /// Stores a new document and returns the assigned id.
    fn add(&self, record: &Record) -> RemoteResult<String>;

    /// Replaces the fields of an existing document.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotFound`](crate::RemoteError::NotFound) if the id is
    /// absent.
    fn update(&self, id: &str, record: &Record) -> RemoteResult<()>;

    /// Deletes a document.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NotFound`](crate::RemoteError::NotFound) if the id is
    /// absent.
    fn delete(&self, id: &str) -> RemoteResult<()>;
}
