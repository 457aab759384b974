//! Live, restartable query result sets.
//!
//! A [`LiveQuery`] couples a change-feed subscription with a re-runnable
//! query, producing a fresh result set after each committed write. This is
//! the mechanism backing list UIs: subscribers always see full result sets,
//! never deltas.

use crate::change_feed::ChangeEvent;
use crate::store::LocalStore;
use smartshop_model::LocalRecord;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

/// A query whose result set can be re-observed after every table change.
pub struct LiveQuery {
    store: Arc<LocalStore>,
    rx: Receiver<ChangeEvent>,
    query: Box<dyn Fn(&LocalStore) -> Vec<LocalRecord> + Send + Sync>,
}

impl LiveQuery {
    /// Evaluates the query against the current table state.
    #[must_use]
    pub fn current(&self) -> Vec<LocalRecord> {
        (self.query)(&self.store)
    }

    /// Blocks until the table changes (or the timeout elapses), then
    /// returns the fresh result set. Bursts of changes that arrived while
    /// waiting are coalesced into one evaluation.
    ///
    /// Returns `None` on timeout or when the store side of the feed has
    /// gone away.
    pub fn next(&self, timeout: Duration) -> Option<Vec<LocalRecord>> {
        self.rx.recv_timeout(timeout).ok()?;
        while self.rx.try_recv().is_ok() {}
        Some(self.current())
    }
}

impl LocalStore {
    /// Builds a live handle over an arbitrary query.
    #[must_use]
    pub fn watch<F>(self: &Arc<Self>, query: F) -> LiveQuery
    where
        F: Fn(&LocalStore) -> Vec<LocalRecord> + Send + Sync + 'static,
    {
        LiveQuery {
            store: Arc::clone(self),
            rx: self.subscribe(),
            query: Box::new(query),
        }
    }

    /// Live handle over [`query_all`](LocalStore::query_all) without
    /// deleted rows, the query backing list screens.
    #[must_use]
    pub fn watch_all(self: &Arc<Self>) -> LiveQuery {
        self.watch(|store| store.query_all(false))
    }
}
