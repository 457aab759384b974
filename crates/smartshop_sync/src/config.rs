//! Configuration for the sync engine.

use std::time::Duration;

/// Tunables for sync behavior.
///
/// There is no exponential backoff: a failed row simply becomes eligible
/// again once its last attempt is older than `retry_threshold` and no
/// permanent error was recorded.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minimum age of the last push attempt before a failed row is
    /// retried.
    pub retry_threshold: Duration,
    /// If set, synced tombstones older than this are purged from the
    /// local table at the end of each successful cycle.
    pub purge_deleted_after: Option<Duration>,
}

impl SyncConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            retry_threshold: Duration::from_secs(60),
            purge_deleted_after: None,
        }
    }

    /// Sets the retry threshold.
    #[must_use]
    pub fn with_retry_threshold(mut self, threshold: Duration) -> Self {
        self.retry_threshold = threshold;
        self
    }

    /// Enables tombstone purging after the given age.
    #[must_use]
    pub fn with_purge_deleted_after(mut self, age: Duration) -> Self {
        self.purge_deleted_after = Some(age);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
