//! Local-first repository facade.

use crate::error::{RepoError, RepoResult};
use crate::identity::{IdentityProvider, ANONYMOUS_OWNER};
use crate::worker::PushWorker;
use smartshop_model::{is_local_id, mapper, now_millis, validate, LocalRecord, Record};
use smartshop_remote::{RemoteError, RemoteStore};
use smartshop_store::{CategoryStat, InventoryStats, LiveQuery, LocalStore};
use smartshop_sync::{SyncConfig, SyncCycleResult, SyncEngine, SyncState, SyncStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The single entry point the application talks to.
///
/// Every write lands in the local store first and returns immediately;
/// a background worker pushes it to the remote afterwards. Every read
/// is served from the local store, so the whole surface works offline.
pub struct Repository<R: RemoteStore + 'static> {
    store: Arc<LocalStore>,
    remote: Arc<R>,
    engine: Arc<SyncEngine<R>>,
    identity: Arc<dyn IdentityProvider>,
    worker: PushWorker,
    bootstrapped: AtomicBool,
}

impl<R: RemoteStore + 'static> Repository<R> {
    /// Wires a repository over the given stores and spawns its push
    /// worker.
    pub fn new(
        store: Arc<LocalStore>,
        remote: Arc<R>,
        identity: Arc<dyn IdentityProvider>,
        config: SyncConfig,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            config,
        ));
        let worker = PushWorker::spawn(Arc::clone(&engine));
        Self {
            store,
            remote,
            engine,
            identity,
            worker,
            bootstrapped: AtomicBool::new(false),
        }
    }

    fn owner(&self) -> String {
        self.identity
            .current_owner()
            .unwrap_or_else(|| ANONYMOUS_OWNER.to_string())
    }

    // --- Writes ---

    /// Validates and stores a new record under a provisional local id,
    /// then queues it for a background push.
    pub fn create(&self, mut record: Record) -> RepoResult<LocalRecord> {
        validate(&record)?;
        if record.owner_id.is_empty() {
            record.owner_id = self.owner();
        }
        record.id.clear();
        let row = mapper::to_local_record(&record, false);
        self.store.upsert(row.clone())?;
        self.worker.enqueue(&row.id);
        Ok(row)
    }

    /// Validates and applies an update to an existing record, then
    /// queues it for a background push.
    pub fn update(&self, id: &str, updated: &Record) -> RepoResult<LocalRecord> {
        validate(updated)?;
        let existing = self
            .store
            .get_by_id(id)
            .filter(|r| !r.is_deleted)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        let row = mapper::apply_update(&existing, updated);
        self.store.upsert(row.clone())?;
        self.worker.enqueue(id);
        Ok(row)
    }

    /// Soft-deletes a record. The row becomes invisible to reads at
    /// once and is physically removed only after the background push
    /// confirms the remote delete.
    pub fn delete(&self, id: &str) -> RepoResult<()> {
        let deleted = self.store.soft_delete(id, now_millis())?;
        if !deleted {
            return Err(RepoError::NotFound(id.to_string()));
        }
        self.worker.enqueue(id);
        Ok(())
    }

    // --- Reads ---

    /// Looks a record up, local store first. A remote-assigned id that
    /// is missing locally falls through to a remote fetch; the result
    /// is returned without being cached, so the local table only ever
    /// holds rows that arrived through a write or a pull. A tombstoned
    /// row reads as absent.
    pub fn get_by_id(&self, id: &str) -> RepoResult<Option<LocalRecord>> {
        if let Some(row) = self.store.get_by_id(id) {
            return Ok((!row.is_deleted).then_some(row));
        }
        if is_local_id(id) {
            return Ok(None);
        }
        match self.remote.get(id) {
            Ok(doc) => Ok(doc.map(|d| mapper::to_local_record(&d, true))),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => {
                tracing::debug!(id = %id, error = %e, "remote lookup failed, reporting absent");
                Ok(None)
            }
        }
    }

    /// All live records, newest first. An empty local store triggers
    /// one bootstrap sync before answering, so a fresh install shows
    /// the remote inventory on first open.
    pub fn list(&self) -> Vec<LocalRecord> {
        if self.store.count() == 0 && !self.bootstrapped.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.engine.sync() {
                tracing::warn!(error = %e, "bootstrap sync failed, serving empty local list");
            }
        }
        self.store.query_all(false)
    }

    /// Live records owned by the current identity, newest first.
    pub fn list_mine(&self) -> Vec<LocalRecord> {
        self.store.query_by_owner(&self.owner())
    }

    /// Live records in a category, name ascending.
    pub fn list_by_category(&self, category: &str) -> Vec<LocalRecord> {
        self.store.query_by_category(category)
    }

    /// Case-insensitive search over name, description and category.
    pub fn search(&self, query: &str) -> Vec<LocalRecord> {
        self.store.search(query)
    }

    /// Inventory roll-up over live records.
    pub fn statistics(&self) -> InventoryStats {
        self.store.statistics()
    }

    /// Per-category stock value roll-up, highest value first.
    pub fn category_stats(&self) -> Vec<CategoryStat> {
        self.store.category_stats()
    }

    /// A live view over all live records; re-evaluates on every store
    /// change, including those made by the sync engine.
    pub fn live_list(&self) -> LiveQuery {
        self.store.watch_all()
    }

    // --- Sync control ---

    /// Runs a foreground pull-then-push cycle.
    pub fn sync_now(&self) -> RepoResult<SyncCycleResult> {
        Ok(self.engine.sync()?)
    }

    /// Drops the local table and re-pulls everything. Destructive:
    /// unsynced local changes are lost.
    pub fn force_resync(&self) -> RepoResult<u64> {
        Ok(self.engine.full_resync()?)
    }

    /// Current sync engine state.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.engine.state()
    }

    /// Cumulative sync counters.
    #[must_use]
    pub fn sync_stats(&self) -> SyncStats {
        self.engine.stats()
    }

    /// The underlying local store, for watch queries beyond
    /// [`live_list`](Self::live_list).
    #[must_use]
    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::FixedIdentity;
    use smartshop_model::ValidationError;
    use smartshop_remote::MemoryRemoteStore;

    fn repo() -> (Arc<MemoryRemoteStore>, Repository<MemoryRemoteStore>) {
        let remote = Arc::new(MemoryRemoteStore::new());
        let repo = Repository::new(
            Arc::new(LocalStore::in_memory()),
            Arc::clone(&remote),
            Arc::new(FixedIdentity::new("tester")),
            SyncConfig::new(),
        );
        (remote, repo)
    }

    #[test]
    fn create_rejects_blank_name() {
        let (_, repo) = repo();
        let err = repo.create(Record::named("  ")).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::BlankName)
        ));
    }

    #[test]
    fn create_stamps_owner_and_local_id() {
        let (_, repo) = repo();
        let row = repo.create(Record::named("Widget")).unwrap();
        assert!(is_local_id(&row.id));
        assert_eq!(row.owner_id, "tester");
        assert!(!row.is_synced);
    }

    #[test]
    fn anonymous_owner_when_signed_out() {
        let repo = Repository::new(
            Arc::new(LocalStore::in_memory()),
            Arc::new(MemoryRemoteStore::new()),
            Arc::new(FixedIdentity::signed_out()),
            SyncConfig::new(),
        );
        let row = repo.create(Record::named("Widget")).unwrap();
        assert_eq!(row.owner_id, ANONYMOUS_OWNER);
    }

    #[test]
    fn update_of_missing_record_is_not_found() {
        let (_, repo) = repo();
        let err = repo.update("nope", &Record::named("Widget")).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[test]
    fn deleted_record_reads_as_absent() {
        let (_, repo) = repo();
        let row = repo.create(Record::named("Widget")).unwrap();
        repo.delete(&row.id).unwrap();
        assert!(repo.get_by_id(&row.id).unwrap().is_none());
        assert!(repo.list().is_empty());
    }

    #[test]
    fn get_by_id_falls_through_to_remote_without_caching() {
        let mut doc = Record::named("RemoteOnly");
        doc.id = "doc-9".into();
        let remote = Arc::new(MemoryRemoteStore::with_documents(vec![doc]));
        let repo = Repository::new(
            Arc::new(LocalStore::in_memory()),
            remote,
            Arc::new(FixedIdentity::new("tester")),
            SyncConfig::new(),
        );

        let found = repo.get_by_id("doc-9").unwrap().unwrap();
        assert_eq!(found.name, "RemoteOnly");
        assert!(repo.store().get_by_id("doc-9").is_none());
    }
}
