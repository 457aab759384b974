//! Sync engine state machine and reconciliation passes.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use smartshop_model::{is_local_id, mapper, now_millis, LocalRecord};
use smartshop_remote::{RemoteError, RemoteStore};
use smartshop_store::{LocalStore, PERMANENT_ERROR_TAG};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine is idle, no cycle has run yet.
    Idle,
    /// Engine is pulling remote documents.
    Pulling,
    /// Engine is pushing dirty local rows.
    Pushing,
    /// Last cycle completed.
    Synced,
    /// Last cycle failed.
    Error,
}

impl SyncState {
    /// Returns true while a cycle is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Pulling | SyncState::Pushing)
    }

    /// Returns true if a new cycle may start.
    #[must_use]
    pub fn can_start_sync(&self) -> bool {
        !self.is_active()
    }
}

/// Cumulative counters across sync cycles.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed cycles.
    pub cycles_completed: u64,
    /// Remote documents pulled into the local table.
    pub records_pulled: u64,
    /// Rows uploaded to the remote.
    pub records_pushed: u64,
    /// Tombstones purged after a successful remote delete.
    pub records_purged: u64,
    /// Per-row push failures recorded for retry.
    pub push_failures: u64,
    /// Time of the last completed cycle.
    pub last_sync_time: Option<Instant>,
    /// Message of the last cycle-level failure.
    pub last_error: Option<String>,
}

/// Outcome of one `push_unsynced` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// Rows uploaded (creates and updates).
    pub pushed: u64,
    /// Tombstones whose remote delete succeeded and were removed locally.
    pub purged: u64,
    /// Rows whose push failed and was recorded for retry.
    pub failed: u64,
}

/// What happened to a single pushed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDisposition {
    /// Row was uploaded and is now clean (unless mutated mid-push).
    Uploaded,
    /// Tombstone was deleted remotely and removed locally.
    Purged,
    /// Row needed no push (missing, or already clean).
    Skipped,
}

/// Result of a full sync cycle.
#[derive(Debug, Clone)]
pub struct SyncCycleResult {
    /// Remote documents pulled.
    pub pulled: u64,
    /// Push pass outcome.
    pub push: PushOutcome,
    /// Duration of the cycle.
    pub duration: Duration,
}

/// Reconciles the local store with a remote store.
///
/// Construct one engine per store pair at process start and share it by
/// `Arc`; there is no process-wide instance.
pub struct SyncEngine<R: RemoteStore> {
    store: Arc<LocalStore>,
    remote: Arc<R>,
    config: SyncConfig,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<R: RemoteStore> SyncEngine<R> {
    /// Creates a new engine over the given stores.
    pub fn new(store: Arc<LocalStore>, remote: Arc<R>, config: SyncConfig) -> Self {
        Self {
            store,
            remote,
            config,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Current engine state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Snapshot of the cumulative counters.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Atomically claims the engine for a new cycle.
    fn try_begin(&self) -> SyncResult<()> {
        let mut state = self.state.write();
        if !state.can_start_sync() {
            return Err(SyncError::AlreadyRunning);
        }
        *state = SyncState::Pulling;
        Ok(())
    }

    /// Fetches every remote document and bulk-upserts it locally with
    /// `is_synced = true`.
    ///
    /// This is a destructive merge for the pulled set: the remote copy
    /// overwrites any concurrently-dirty local row with the same id.
    /// Rows the remote does not mention are left alone, so local-only
    /// creations always survive a pull.
    pub fn pull_all(&self) -> SyncResult<u64> {
        let documents = self.remote.get_all()?;
        let count = documents.len() as u64;

        let rows: Vec<LocalRecord> = documents
            .iter()
            .map(|doc| mapper::to_local_record(doc, true))
            .collect();
        self.store.upsert_many(rows)?;

        tracing::debug!(pulled = count, "pull pass complete");
        self.stats.write().records_pulled += count;
        Ok(count)
    }

    /// Pushes every retry-eligible dirty row: remote deletes for
    /// tombstones (followed by local purge), remote upserts for the rest.
    ///
    /// Each row's failure is isolated: the error is recorded into the
    /// row's bookkeeping and the pass continues. Only local store
    /// failures abort the pass.
    pub fn push_unsynced(&self) -> SyncResult<PushOutcome> {
        let now = now_millis();
        let cutoff = now - self.config.retry_threshold.as_millis() as i64;

        let candidates = self.store.retry_eligible(cutoff);
        // Tombstones first, then dirty upserts.
        let (deletes, upserts): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|r| r.is_deleted);

        let mut outcome = PushOutcome::default();
        for row in deletes.iter().chain(upserts.iter()) {
            match self.push_row(row) {
                Ok(PushDisposition::Uploaded) => outcome.pushed += 1,
                Ok(PushDisposition::Purged) => outcome.purged += 1,
                Ok(PushDisposition::Skipped) => {}
                Err(SyncError::Remote(e)) => {
                    tracing::warn!(id = %row.id, error = %e, "push failed, will retry later");
                    self.store.record_sync_attempt(&row.id, now, &error_tag(&e))?;
                    outcome.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        {
            let mut stats = self.stats.write();
            stats.records_pushed += outcome.pushed;
            stats.records_purged += outcome.purged;
            stats.push_failures += outcome.failed;
        }
        Ok(outcome)
    }

    /// Pushes the single row with the given id, if it is still dirty.
    ///
    /// This is the entry point for the background push worker. A remote
    /// failure is recorded into the row and returned so the caller can
    /// log it; it is never re-surfaced to the foreground.
    pub fn push_pending(&self, id: &str) -> SyncResult<PushDisposition> {
        let Some(row) = self.store.get_by_id(id) else {
            return Ok(PushDisposition::Skipped);
        };
        if row.is_synced {
            return Ok(PushDisposition::Skipped);
        }

        match self.push_row(&row) {
            Ok(disposition) => Ok(disposition),
            Err(SyncError::Remote(e)) => {
                self.store
                    .record_sync_attempt(id, now_millis(), &error_tag(&e))?;
                self.stats.write().push_failures += 1;
                Err(SyncError::Remote(e))
            }
            Err(e) => Err(e),
        }
    }

    fn push_row(&self, row: &LocalRecord) -> SyncResult<PushDisposition> {
        // Guard for the completion writes: a local mutation that lands
        // while the remote call is in flight bumps updated_at, and the
        // stale push must not mark the row clean (or remove it).
        let observed = row.updated_at;

        if row.is_deleted {
            match self.remote.delete(&row.id) {
                // Already gone remotely counts as a successful delete.
                Ok(()) | Err(RemoteError::NotFound(_)) => {
                    self.store.remove_if_unchanged(&row.id, observed)?;
                    Ok(PushDisposition::Purged)
                }
                Err(e) => Err(e.into()),
            }
        } else if is_local_id(&row.id) {
            let assigned = self.remote.add(&mapper::to_record(row))?;
            self.store.reassign_id(&row.id, &assigned, observed)?;
            Ok(PushDisposition::Uploaded)
        } else {
            let record = mapper::to_record(row);
            match self.remote.update(&row.id, &record) {
                Ok(()) => {
                    self.store.mark_synced_if(&row.id, observed)?;
                    Ok(PushDisposition::Uploaded)
                }
                // The remote copy vanished; the dirty local copy wins and
                // is re-created under a fresh remote id.
                Err(RemoteError::NotFound(_)) => {
                    let assigned = self.remote.add(&record)?;
                    if assigned == row.id {
                        self.store.mark_synced_if(&row.id, observed)?;
                    } else {
                        self.store.reassign_id(&row.id, &assigned, observed)?;
                    }
                    Ok(PushDisposition::Uploaded)
                }
                Err(e) => Err(e.into()),
            }
        }
    }

    /// Hard-resets the local table, then pulls everything.
    ///
    /// Recovery hatch for detected corruption or a forced refresh. This
    /// is destructive: any currently-unsynced local change is lost.
    pub fn full_resync(&self) -> SyncResult<u64> {
        tracing::info!("full resync: dropping local table");
        self.store.delete_all()?;
        self.pull_all()
    }

    /// Runs one pull-then-push cycle.
    pub fn sync(&self) -> SyncResult<SyncCycleResult> {
        let start = Instant::now();
        self.try_begin()?;

        let pulled = match self.pull_all() {
            Ok(count) => count,
            Err(e) => return Err(self.fail(e)),
        };

        self.set_state(SyncState::Pushing);
        let push = match self.push_unsynced() {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };

        if let Some(age) = self.config.purge_deleted_after {
            let threshold = now_millis() - age.as_millis() as i64;
            if let Err(e) = self.store.purge_deleted_before(threshold) {
                return Err(self.fail(e.into()));
            }
        }

        self.set_state(SyncState::Synced);
        {
            let mut stats = self.stats.write();
            stats.cycles_completed += 1;
            stats.last_sync_time = Some(Instant::now());
            stats.last_error = None;
        }

        let result = SyncCycleResult {
            pulled,
            push,
            duration: start.elapsed(),
        };
        tracing::info!(
            pulled = result.pulled,
            pushed = result.push.pushed,
            purged = result.push.purged,
            failed = result.push.failed,
            "sync cycle complete"
        );
        Ok(result)
    }

    fn fail(&self, error: SyncError) -> SyncError {
        self.set_state(SyncState::Error);
        self.stats.write().last_error = Some(error.to_string());
        error
    }
}

/// Renders a remote error for the row's `sync_error` field, tagging
/// non-retryable failures so the retry predicate skips them.
fn error_tag(error: &RemoteError) -> String {
    if error.is_retryable() {
        error.to_string()
    } else {
        format!("{PERMANENT_ERROR_TAG}{error}")
    }
}
