//! End-to-end offline-first scenarios over the full stack: repository,
//! push worker, sync engine, local store and the in-memory remote.

use smartshop_model::{is_local_id, Record};
use smartshop_remote::{MemoryRemoteStore, RemoteOp};
use smartshop_repo::{FixedIdentity, Repository};
use smartshop_store::{FileBackend, LocalStore, SnapshotBackend};
use smartshop_sync::{SyncConfig, SyncState};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn build(remote: Arc<MemoryRemoteStore>, config: SyncConfig) -> Repository<MemoryRemoteStore> {
    Repository::new(
        Arc::new(LocalStore::in_memory()),
        remote,
        Arc::new(FixedIdentity::new("user-1")),
        config,
    )
}

fn record(name: &str, price: f64, quantity: u32, category: &str) -> Record {
    let mut r = Record::named(name);
    r.price = price;
    r.quantity = quantity;
    r.category = category.into();
    r
}

/// Polls until the background worker settles the condition.
fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn create_lands_locally_then_syncs_in_background() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let repo = build(Arc::clone(&remote), SyncConfig::new());

    let created = repo.create(record("Espresso beans", 12.5, 8, "Coffee")).unwrap();
    assert!(is_local_id(&created.id));

    wait_for("background push", || remote.len() == 1);
    wait_for("id reassignment", || repo.store().unsynced().is_empty());

    // the provisional id is gone, the remote-assigned one is clean
    assert!(repo.get_by_id(&created.id).unwrap().is_none());
    let uploaded = remote.documents().remove(0);
    assert!(!is_local_id(&uploaded.id));
    let row = repo.get_by_id(&uploaded.id).unwrap().unwrap();
    assert!(row.is_synced);
    assert_eq!(row.owner_id, "user-1");
}

#[test]
fn offline_create_is_retried_by_the_next_cycle() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.set_offline(true);
    let repo = build(
        Arc::clone(&remote),
        SyncConfig::new().with_retry_threshold(Duration::ZERO),
    );

    let created = repo.create(record("Oat milk", 2.2, 12, "Dairy")).unwrap();
    wait_for("recorded failure", || {
        repo.store()
            .get_by_id(&created.id)
            .is_some_and(|r| !r.sync_error.is_empty())
    });
    assert!(remote.is_empty());

    remote.set_offline(false);
    thread::sleep(Duration::from_millis(2));
    repo.sync_now().unwrap();

    assert_eq!(remote.len(), 1);
    assert!(repo.store().unsynced().is_empty());
    assert_eq!(repo.sync_state(), SyncState::Synced);
}

#[test]
fn delete_is_soft_until_the_remote_confirms() {
    let mut doc = record("Rye bread", 3.1, 4, "Bakery");
    doc.id = "doc-1".into();
    let remote = Arc::new(MemoryRemoteStore::with_documents(vec![doc]));
    let repo = build(Arc::clone(&remote), SyncConfig::new());
    repo.sync_now().unwrap();

    remote.set_offline(true);
    repo.delete("doc-1").unwrap();

    // invisible to reads, still present as a dirty tombstone
    assert!(repo.get_by_id("doc-1").unwrap().is_none());
    wait_for("failed delete push", || {
        repo.store()
            .get_by_id("doc-1")
            .is_some_and(|r| r.is_deleted && !r.sync_error.is_empty())
    });
    assert!(remote.contains("doc-1"));

    remote.set_offline(false);
    // within the default retry threshold the tombstone is skipped, so a
    // cycle right after the failure leaves it in place
    repo.sync_now().unwrap();
    assert!(repo.store().get_by_id("doc-1").is_some());
}

#[test]
fn delete_purges_after_successful_push() {
    let mut doc = record("Rye bread", 3.1, 4, "Bakery");
    doc.id = "doc-1".into();
    let remote = Arc::new(MemoryRemoteStore::with_documents(vec![doc]));
    let repo = build(Arc::clone(&remote), SyncConfig::new());
    repo.sync_now().unwrap();

    repo.delete("doc-1").unwrap();
    wait_for("delete push", || !remote.contains("doc-1"));
    wait_for("local purge", || repo.store().get_by_id("doc-1").is_none());
}

#[test]
fn pull_of_empty_remote_never_drops_local_work() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.set_offline(true);
    let repo = build(Arc::clone(&remote), SyncConfig::new());

    let created = repo.create(record("Honey", 6.0, 3, "Pantry")).unwrap();
    wait_for("recorded failure", || {
        repo.store()
            .get_by_id(&created.id)
            .is_some_and(|r| r.last_sync_attempt > 0)
    });

    remote.set_offline(false);
    // default 60s retry threshold: the push half skips the fresh failure,
    // and the pull half must leave the local-only row alone
    repo.sync_now().unwrap();
    assert_eq!(repo.list().len(), 1);
}

#[test]
fn second_cycle_without_changes_is_quiet() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let repo = build(Arc::clone(&remote), SyncConfig::new());
    repo.create(record("Butter", 4.5, 6, "Dairy")).unwrap();

    wait_for("background push", || repo.store().unsynced().is_empty());
    repo.sync_now().unwrap();
    let adds = remote.calls(RemoteOp::Add);
    let updates = remote.calls(RemoteOp::Update);

    repo.sync_now().unwrap();
    assert_eq!(remote.calls(RemoteOp::Add), adds);
    assert_eq!(remote.calls(RemoteOp::Update), updates);
    assert_eq!(remote.calls(RemoteOp::Delete), 0);
}

#[test]
fn statistics_reflect_local_and_pulled_records() {
    let mut pulled = record("Flour", 1.5, 0, "Pantry");
    pulled.id = "doc-flour".into();
    let remote = Arc::new(MemoryRemoteStore::with_documents(vec![pulled]));
    let repo = build(remote, SyncConfig::new());
    repo.sync_now().unwrap();

    repo.create(record("Espresso beans", 12.5, 8, "Coffee")).unwrap();
    repo.create(record("Filter coffee", 9.0, 20, "Coffee")).unwrap();

    let stats = repo.statistics();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.out_of_stock_count, 1); // flour
    assert_eq!(stats.low_stock_count, 1); // espresso, 0 < 8 < 10
    assert!((stats.total_stock_value - (12.5 * 8.0 + 9.0 * 20.0)).abs() < 1e-9);

    let by_category = repo.category_stats();
    assert_eq!(by_category[0].category, "Coffee");
}

#[test]
fn live_list_observes_background_sync() {
    let mut doc = record("Tea", 3.0, 10, "Beverages");
    doc.id = "doc-tea".into();
    let remote = Arc::new(MemoryRemoteStore::with_documents(vec![doc]));
    let repo = build(remote, SyncConfig::new());

    let live = repo.live_list();
    assert!(live.current().is_empty());

    repo.sync_now().unwrap();
    let rows = live.next(Duration::from_secs(2)).expect("change event");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "doc-tea");
}

#[test]
fn bootstrap_sync_fills_an_empty_store_on_first_list() {
    let mut doc = record("Tea", 3.0, 10, "Beverages");
    doc.id = "doc-tea".into();
    let remote = Arc::new(MemoryRemoteStore::with_documents(vec![doc]));
    let repo = build(remote, SyncConfig::new());

    let rows = repo.list();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_synced);
}

#[test]
fn force_resync_restores_the_remote_truth() {
    let mut doc = record("Tea", 3.0, 10, "Beverages");
    doc.id = "doc-tea".into();
    let remote = Arc::new(MemoryRemoteStore::with_documents(vec![doc]));
    remote.set_offline(true);
    let repo = build(Arc::clone(&remote), SyncConfig::new());

    let stray = repo.create(record("Stray", 1.0, 1, "Misc")).unwrap();
    wait_for("recorded failure", || {
        repo.store()
            .get_by_id(&stray.id)
            .is_some_and(|r| r.last_sync_attempt > 0)
    });

    remote.set_offline(false);
    let pulled = repo.force_resync().unwrap();
    assert_eq!(pulled, 1);
    assert!(repo.get_by_id(&stray.id).unwrap().is_none());
    assert_eq!(repo.list().len(), 1);
}

#[test]
fn rows_survive_a_reopen_of_the_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.db");

    let created = {
        let backend: Arc<dyn SnapshotBackend> = Arc::new(FileBackend::open(&path).unwrap());
        let store = Arc::new(LocalStore::open(backend).unwrap());
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_offline(true);
        let repo = Repository::new(
            store,
            remote,
            Arc::new(FixedIdentity::new("user-1")),
            SyncConfig::new(),
        );
        repo.create(record("Persisted", 5.0, 2, "Misc")).unwrap()
    };

    let backend: Arc<dyn SnapshotBackend> = Arc::new(FileBackend::open(&path).unwrap());
    let store = LocalStore::open(backend).unwrap();
    let row = store.get_by_id(&created.id).expect("row after reopen");
    assert_eq!(row.name, "Persisted");
    assert!(!row.is_synced);
}
