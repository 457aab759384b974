//! Background push worker.
//!
//! A single dedicated thread drains a queue of record ids and pushes
//! each through the sync engine. One thread means one in-flight push at
//! a time, which keeps the store's in-flight guards simple to reason
//! about. Push failures are recorded into the row's retry bookkeeping
//! by the engine and only logged here; they never reach the caller.

use smartshop_remote::RemoteStore;
use smartshop_sync::SyncEngine;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Handle to the background push thread.
///
/// Dropping the worker closes the queue and joins the thread after it
/// drains whatever was already enqueued.
pub struct PushWorker {
    tx: Option<mpsc::Sender<String>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PushWorker {
    /// Spawns the push thread over the given engine.
    pub fn spawn<R: RemoteStore + 'static>(engine: Arc<SyncEngine<R>>) -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        let handle = thread::Builder::new()
            .name("smartshop-push".into())
            .spawn(move || {
                for id in rx {
                    if let Err(e) = engine.push_pending(&id) {
                        tracing::warn!(id = %id, error = %e, "background push failed");
                    }
                }
            })
            .ok();
        if handle.is_none() {
            tracing::warn!("could not spawn push worker; writes will wait for the next sync cycle");
        }
        Self {
            tx: Some(tx),
            handle,
        }
    }

    /// Queues a record id for a background push. A full or closed queue
    /// is not an error: the row stays dirty and the next sync cycle
    /// picks it up.
    pub fn enqueue(&self, id: &str) {
        if let Some(tx) = &self.tx {
            if tx.send(id.to_string()).is_err() {
                tracing::warn!(id = %id, "push queue closed, deferring to next sync cycle");
            }
        }
    }
}

impl Drop for PushWorker {
    fn drop(&mut self) {
        // Closing the sender ends the thread's receive loop.
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
