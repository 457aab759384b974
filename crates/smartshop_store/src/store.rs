//! The local record table.

use crate::backend::{MemoryBackend, SnapshotBackend};
use crate::change_feed::{ChangeEvent, ChangeFeed, ChangeKind};
use crate::error::{StoreError, StoreResult};
use crate::stats::{category_rollup, CategoryStat, InventoryStats};
use parking_lot::RwLock;
use smartshop_model::LocalRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Prefix marking a recorded sync error as not worth retrying.
///
/// The sync engine tags errors from non-retryable remote failures with this
/// prefix; [`LocalStore::retry_eligible`] excludes such rows.
pub const PERMANENT_ERROR_TAG: &str = "permanent: ";

/// Durable keyed table of [`LocalRecord`], the single source of truth for
/// callers.
///
/// All writes go through one table lock and become visible only after the
/// snapshot has been persisted through the backend; change events fire
/// after that, outside the lock. Read-modify-write operations
/// (`mark_synced`, `record_sync_attempt`, ...) are therefore atomic per id.
pub struct LocalStore {
    backend: Arc<dyn SnapshotBackend>,
    table: RwLock<HashMap<String, LocalRecord>>,
    feed: ChangeFeed,
    sequence: AtomicU64,
}

impl LocalStore {
    /// Opens a store over the given backend, loading any previous snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot cannot be read or decoded.
    pub fn open(backend: Arc<dyn SnapshotBackend>) -> StoreResult<Self> {
        let table = match backend.load()? {
            Some(bytes) => {
                let rows: Vec<LocalRecord> = ciborium::from_reader(bytes.as_slice())
                    .map_err(|e| StoreError::Corrupted(e.to_string()))?;
                rows.into_iter().map(|r| (r.id.clone(), r)).collect()
            }
            None => HashMap::new(),
        };

        tracing::debug!(rows = table.len(), "local store opened");

        Ok(Self {
            backend,
            table: RwLock::new(table),
            feed: ChangeFeed::new(),
            sequence: AtomicU64::new(0),
        })
    }

    /// Creates an ephemeral store for tests and previews.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
            table: RwLock::new(HashMap::new()),
            feed: ChangeFeed::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Subscribes to committed change events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    fn persist(&self, table: &HashMap<String, LocalRecord>) -> StoreResult<()> {
        let mut rows: Vec<&LocalRecord> = table.values().collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        let mut buf = Vec::new();
        ciborium::into_writer(&rows, &mut buf).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.backend.save(&buf)
    }

    /// Runs one committed write.
    ///
    /// The operation mutates a working copy of the table and reports the
    /// changed ids. The copy is persisted first and only then swapped in,
    /// so a failed save leaves table and snapshot untouched. Events fire
    /// after the lock is released.
    fn commit<T>(
        &self,
        op: impl FnOnce(&mut HashMap<String, LocalRecord>) -> (T, Vec<(String, ChangeKind)>),
    ) -> StoreResult<T> {
        let mut events = Vec::new();
        let result;
        {
            let mut table = self.table.write();
            let mut working = table.clone();
            let (value, changes) = op(&mut working);
            if !changes.is_empty() {
                self.persist(&working)?;
                *table = working;
                for (record_id, kind) in changes {
                    events.push(ChangeEvent {
                        sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
                        record_id,
                        kind,
                    });
                }
            }
            result = value;
        }
        self.feed.emit_batch(events);
        Ok(result)
    }

    // --- Writes ---

    /// Inserts or replaces a row.
    pub fn upsert(&self, record: LocalRecord) -> StoreResult<()> {
        self.commit(|table| {
            let id = record.id.clone();
            let kind = if table.contains_key(&id) {
                ChangeKind::Update
            } else {
                ChangeKind::Insert
            };
            table.insert(id.clone(), record);
            ((), vec![(id, kind)])
        })
    }

    /// Inserts or replaces a batch of rows in one committed write.
    pub fn upsert_many(&self, records: Vec<LocalRecord>) -> StoreResult<()> {
        self.commit(|table| {
            let mut changes = Vec::with_capacity(records.len());
            for record in records {
                let id = record.id.clone();
                let kind = if table.contains_key(&id) {
                    ChangeKind::Update
                } else {
                    ChangeKind::Insert
                };
                table.insert(id.clone(), record);
                changes.push((id, kind));
            }
            ((), changes)
        })
    }

    /// Physically removes a row. Returns whether it existed.
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        self.commit(|table| match table.remove(id) {
            Some(_) => (true, vec![(id.to_string(), ChangeKind::HardDelete)]),
            None => (false, Vec::new()),
        })
    }

    /// Physically removes a row only if it still has the given
    /// `updated_at`. Used by the sync engine so a concurrent local
    /// mutation wins over a completing push-delete.
    pub fn remove_if_unchanged(&self, id: &str, expected_updated_at: i64) -> StoreResult<bool> {
        self.commit(|table| match table.get(id) {
            Some(row) if row.updated_at == expected_updated_at => {
                table.remove(id);
                (true, vec![(id.to_string(), ChangeKind::HardDelete)])
            }
            _ => (false, Vec::new()),
        })
    }

    /// Marks a row deleted without removing it. The row stays pushable.
    pub fn soft_delete(&self, id: &str, timestamp: i64) -> StoreResult<bool> {
        self.commit(|table| match table.get_mut(id) {
            Some(row) => {
                row.is_deleted = true;
                row.is_synced = false;
                row.updated_at = timestamp;
                (true, vec![(id.to_string(), ChangeKind::SoftDelete)])
            }
            None => (false, Vec::new()),
        })
    }

    /// Hard-resets the table. Used by full resync; loses unsynced rows.
    pub fn delete_all(&self) -> StoreResult<()> {
        self.commit(|table| {
            let changes = table
                .drain()
                .map(|(id, _)| (id, ChangeKind::HardDelete))
                .collect();
            ((), changes)
        })
    }

    /// Removes soft-deleted rows that were already pushed and whose last
    /// mutation is older than `threshold` millis. Returns how many went.
    pub fn purge_deleted_before(&self, threshold: i64) -> StoreResult<usize> {
        self.commit(|table| {
            let stale: Vec<String> = table
                .values()
                .filter(|r| r.is_deleted && r.is_synced && r.updated_at < threshold)
                .map(|r| r.id.clone())
                .collect();
            for id in &stale {
                table.remove(id);
            }
            let count = stale.len();
            (
                count,
                stale
                    .into_iter()
                    .map(|id| (id, ChangeKind::HardDelete))
                    .collect(),
            )
        })
    }

    // --- Sync bookkeeping ---

    /// Marks a row as matching the remote copy and clears its error.
    pub fn mark_synced(&self, id: &str) -> StoreResult<bool> {
        self.commit(|table| match table.get_mut(id) {
            Some(row) => {
                row.is_synced = true;
                row.sync_error.clear();
                (true, vec![(id.to_string(), ChangeKind::Update)])
            }
            None => (false, Vec::new()),
        })
    }

    /// Guarded [`mark_synced`](Self::mark_synced): only applies if the row
    /// still has the given `updated_at`, so a push that raced with a newer
    /// local mutation cannot mark stale data clean.
    pub fn mark_synced_if(&self, id: &str, expected_updated_at: i64) -> StoreResult<bool> {
        self.commit(|table| match table.get_mut(id) {
            Some(row) if row.updated_at == expected_updated_at => {
                row.is_synced = true;
                row.sync_error.clear();
                (true, vec![(id.to_string(), ChangeKind::Update)])
            }
            _ => (false, Vec::new()),
        })
    }

    /// Records the outcome of a push attempt.
    pub fn record_sync_attempt(&self, id: &str, timestamp: i64, error: &str) -> StoreResult<bool> {
        self.commit(|table| match table.get_mut(id) {
            Some(row) => {
                row.last_sync_attempt = timestamp;
                row.sync_error = error.to_string();
                (true, vec![(id.to_string(), ChangeKind::Update)])
            }
            None => (false, Vec::new()),
        })
    }

    /// Moves a row to a remote-assigned id after its first successful
    /// push. The row is marked synced only if it still has the given
    /// `updated_at`; a row mutated mid-push keeps the new id but stays
    /// dirty so the next push uploads the newer contents. Returns whether
    /// the old row existed.
    pub fn reassign_id(
        &self,
        old_id: &str,
        new_id: &str,
        expected_updated_at: i64,
    ) -> StoreResult<bool> {
        self.commit(|table| match table.remove(old_id) {
            Some(mut row) => {
                row.id = new_id.to_string();
                if row.updated_at == expected_updated_at {
                    row.is_synced = true;
                    row.sync_error.clear();
                }
                table.insert(new_id.to_string(), row);
                (
                    true,
                    vec![
                        (old_id.to_string(), ChangeKind::HardDelete),
                        (new_id.to_string(), ChangeKind::Insert),
                    ],
                )
            }
            None => (false, Vec::new()),
        })
    }

    // --- Reads ---

    /// Looks a row up by id, including soft-deleted rows.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<LocalRecord> {
        self.table.read().get(id).cloned()
    }

    fn select(&self, filter: impl Fn(&LocalRecord) -> bool) -> Vec<LocalRecord> {
        self.table
            .read()
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect()
    }

    /// All rows ordered by creation time, newest first.
    ///
    /// Soft-deleted rows are excluded unless requested.
    #[must_use]
    pub fn query_all(&self, include_deleted: bool) -> Vec<LocalRecord> {
        let mut rows = self.select(|r| include_deleted || !r.is_deleted);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    /// Live rows owned by the given principal, newest first.
    #[must_use]
    pub fn query_by_owner(&self, owner_id: &str) -> Vec<LocalRecord> {
        let mut rows = self.select(|r| !r.is_deleted && r.owner_id == owner_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    /// Live rows in the given category, by name.
    #[must_use]
    pub fn query_by_category(&self, category: &str) -> Vec<LocalRecord> {
        let mut rows = self.select(|r| !r.is_deleted && r.category == category);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Case-insensitive substring match over name, description and
    /// category of live rows, by name.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<LocalRecord> {
        let needle = query.to_lowercase();
        let mut rows = self.select(|r| {
            !r.is_deleted
                && (r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
                    || r.category.to_lowercase().contains(&needle))
        });
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Dirty rows awaiting an upsert push.
    #[must_use]
    pub fn unsynced(&self) -> Vec<LocalRecord> {
        self.select(|r| !r.is_synced && !r.is_deleted)
    }

    /// Soft-deleted rows awaiting a delete push. These must never be
    /// physically removed until the remote delete succeeds.
    #[must_use]
    pub fn deleted_unsynced(&self) -> Vec<LocalRecord> {
        self.select(|r| r.is_deleted && !r.is_synced)
    }

    /// Dirty rows (upserts and deletes) eligible for a push attempt: last
    /// attempt older than `cutoff` millis and no permanent error recorded.
    #[must_use]
    pub fn retry_eligible(&self, cutoff: i64) -> Vec<LocalRecord> {
        self.select(|r| {
            !r.is_synced
                && r.last_sync_attempt < cutoff
                && !r.sync_error.starts_with(PERMANENT_ERROR_TAG)
        })
    }

    /// Number of live rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.table.read().values().filter(|r| !r.is_deleted).count()
    }

    /// Inventory-wide aggregates over live rows.
    #[must_use]
    pub fn statistics(&self) -> InventoryStats {
        let table = self.table.read();
        InventoryStats::collect(table.values().filter(|r| !r.is_deleted))
    }

    /// Per-category rollups over live rows, by stock value descending.
    #[must_use]
    pub fn category_stats(&self) -> Vec<CategoryStat> {
        let table = self.table.read();
        category_rollup(table.values().filter(|r| !r.is_deleted))
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("rows", &self.table.read().len())
            .field("subscribers", &self.feed.subscriber_count())
            .finish_non_exhaustive()
    }
}
