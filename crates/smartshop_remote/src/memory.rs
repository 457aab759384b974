//! In-memory remote store with fault injection.

use crate::error::{RemoteError, RemoteResult};
use crate::store::RemoteStore;
use parking_lot::{Mutex, RwLock};
use smartshop_model::Record;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// The operations of the [`RemoteStore`] contract, used to target fault
/// injection and read call counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    /// `get(id)`.
    Get,
    /// `get_all()`.
    GetAll,
    /// `add(record)`.
    Add,
    /// `update(id, record)`.
    Update,
    /// `delete(id)`.
    Delete,
}

/// An in-process [`RemoteStore`] for tests and previews.
///
/// Supports an offline switch (every call fails transiently), one-shot
/// fault injection per operation, and per-operation call counters so tests
/// can assert things like "the second push made zero remote calls".
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: RwLock<HashMap<String, Record>>,
    offline: AtomicBool,
    injected: Mutex<HashMap<RemoteOp, Vec<RemoteError>>>,
    calls: Mutex<HashMap<RemoteOp, u64>>,
}

impl MemoryRemoteStore {
    /// Creates an empty remote collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection seeded with documents. Each record's id is
    /// used as the document id and must be non-empty.
    #[must_use]
    pub fn with_documents(records: Vec<Record>) -> Self {
        let store = Self::new();
        {
            let mut documents = store.documents.write();
            for record in records {
                documents.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Switches the simulated connectivity. While offline, every call
    /// fails with a transient error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Queues an error to be returned by the next call of the given
    /// operation. Multiple queued errors are consumed in order.
    pub fn fail_next(&self, op: RemoteOp, error: RemoteError) {
        self.injected.lock().entry(op).or_default().push(error);
    }

    /// Number of calls made to the given operation.
    #[must_use]
    pub fn calls(&self, op: RemoteOp) -> u64 {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Snapshot of all documents, sorted by id.
    #[must_use]
    pub fn documents(&self) -> Vec<Record> {
        let mut docs: Vec<Record> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    /// Whether the collection holds the given id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.documents.read().contains_key(id)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn check(&self, op: RemoteOp) -> RemoteResult<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Transient("remote unreachable".into()));
        }

        let mut injected = self.injected.lock();
        if let Some(queue) = injected.get_mut(&op) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn get(&self, id: &str) -> RemoteResult<Option<Record>> {
        self.check(RemoteOp::Get)?;
        Ok(self.documents.read().get(id).cloned())
    }

    fn get_all(&self) -> RemoteResult<Vec<Record>> {
        self.check(RemoteOp::GetAll)?;
        Ok(self.documents())
    }

    fn add(&self, record: &Record) -> RemoteResult<String> {
        self.check(RemoteOp::Add)?;

        let id = Uuid::new_v4().simple().to_string();
        let mut stored = record.clone();
        stored.id = id.clone();
        self.documents.write().insert(id.clone(), stored);
        Ok(id)
    }

    fn update(&self, id: &str, record: &Record) -> RemoteResult<()> {
        self.check(RemoteOp::Update)?;

        let mut documents = self.documents.write();
        match documents.get_mut(id) {
            Some(existing) => {
                *existing = record.clone();
                existing.id = id.to_string();
                Ok(())
            }
            None => Err(RemoteError::NotFound(id.to_string())),
        }
    }

    fn delete(&self, id: &str) -> RemoteResult<()> {
        self.check(RemoteOp::Delete)?;

        match self.documents.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Record {
        Record::named(name)
    }

    #[test]
    fn add_assigns_id() {
        let remote = MemoryRemoteStore::new();
        let id = remote.add(&record("Widget")).unwrap();

        assert!(!id.is_empty());
        let fetched = remote.get(&id).unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.name, "Widget");
    }

    #[test]
    fn update_requires_existing_document() {
        let remote = MemoryRemoteStore::new();
        assert_eq!(
            remote.update("missing", &record("x")),
            Err(RemoteError::NotFound("missing".into()))
        );

        let id = remote.add(&record("Widget")).unwrap();
        let mut changed = record("Widget v2");
        changed.id = id.clone();
        remote.update(&id, &changed).unwrap();
        assert_eq!(remote.get(&id).unwrap().unwrap().name, "Widget v2");
    }

    #[test]
    fn delete_removes_document() {
        let remote = MemoryRemoteStore::new();
        let id = remote.add(&record("Widget")).unwrap();

        remote.delete(&id).unwrap();
        assert!(remote.get(&id).unwrap().is_none());
        assert_eq!(
            remote.delete(&id),
            Err(RemoteError::NotFound(id))
        );
    }

    #[test]
    fn offline_fails_everything_transiently() {
        let remote = MemoryRemoteStore::new();
        remote.set_offline(true);

        assert!(matches!(
            remote.get_all(),
            Err(RemoteError::Transient(_))
        ));
        assert!(matches!(
            remote.add(&record("x")),
            Err(RemoteError::Transient(_))
        ));

        remote.set_offline(false);
        assert!(remote.get_all().unwrap().is_empty());
    }

    #[test]
    fn injected_fault_fires_once() {
        let remote = MemoryRemoteStore::new();
        remote.fail_next(RemoteOp::Add, RemoteError::Transient("hiccup".into()));

        assert!(remote.add(&record("x")).is_err());
        assert!(remote.add(&record("x")).is_ok());
    }

    #[test]
    fn call_counters() {
        let remote = MemoryRemoteStore::new();
        assert_eq!(remote.calls(RemoteOp::GetAll), 0);

        let _ = remote.get_all();
        let _ = remote.get_all();
        let _ = remote.get("nope");

        assert_eq!(remote.calls(RemoteOp::GetAll), 2);
        assert_eq!(remote.calls(RemoteOp::Get), 1);
        assert_eq!(remote.calls(RemoteOp::Add), 0);
    }

    #[test]
    fn seeded_documents_are_listed() {
        let mut a = record("a");
        a.id = "doc-a".into();
        let mut b = record("b");
        b.id = "doc-b".into();

        let remote = MemoryRemoteStore::with_documents(vec![b, a]);
        let docs = remote.get_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "doc-a");
    }
}
