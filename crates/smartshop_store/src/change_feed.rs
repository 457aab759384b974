//! Change feed for observing committed writes.
//!
//! The feed emits one event per committed row change, after the snapshot
//! has been persisted. Both the sync layer and live UI queries subscribe
//! through the same mechanism.

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// Kind of change applied to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Row inserted (no previous version existed).
    Insert,
    /// Row updated in place, including sync-metadata updates.
    Update,
    /// Row soft-deleted (still present, marked deleted).
    SoftDelete,
    /// Row physically removed.
    HardDelete,
}

/// A single committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Commit sequence, monotonically increasing per store.
    pub sequence: u64,
    /// Id of the affected row.
    pub record_id: String,
    /// What happened to it.
    pub kind: ChangeKind,
}

/// Distributes committed changes to subscribers.
///
/// Subscribers that drop their receiver are pruned on the next emit.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
}

impl ChangeFeed {
    /// Creates an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to all future change events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all live subscribers.
    pub fn emit(&self, event: ChangeEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Emits the events of one committed write in order.
    pub fn emit_batch(&self, events: Vec<ChangeEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
