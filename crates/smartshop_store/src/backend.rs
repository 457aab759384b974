//! Snapshot backend trait and implementations.
//!
//! Backends are opaque byte stores for the encoded table snapshot. They do
//! not interpret the data; the store owns the snapshot format.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable storage for the encoded table snapshot.
///
/// # Invariants
///
/// - `load` returns exactly the bytes of the last successful `save`,
///   or `None` if nothing was ever saved
/// - after `save` returns, the snapshot survives process termination
///   (for backends that persist at all)
pub trait SnapshotBackend: Send + Sync {
    /// Loads the last saved snapshot, if any.
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Durably replaces the snapshot.
    fn save(&self, bytes: &[u8]) -> StoreResult<()>;
}

/// An in-memory backend for tests and ephemeral stores.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<Option<Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with snapshot bytes.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Returns a copy of the current snapshot bytes.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn save(&self, bytes: &[u8]) -> StoreResult<()> {
        *self.data.write() = Some(bytes.to_vec());
        Ok(())
    }
}

/// A file-backed snapshot backend.
///
/// Saves write to a temporary sibling file, fsync, then rename over the
/// snapshot path, so a crash mid-save leaves the previous snapshot intact.
/// An advisory `fs2` lock on a sibling `.lock` file keeps a second process
/// from opening the same store.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    // Held open for the lifetime of the backend; the advisory lock is
    // released when the file is dropped.
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a file backend at the given snapshot path.
    ///
    /// Parent directories are created if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Locked`] if another process holds the lock,
    /// or an I/O error if the lock file cannot be created.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, bytes: &[u8]) -> StoreResult<()> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(bytes)?;
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
