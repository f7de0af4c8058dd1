//! Per-directory locks serializing mutating operations

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};

#[derive(Debug, Default)]
struct PathLock {
    /// Held for the whole of a mutation; only mutations contend on it
    mutation: Arc<AsyncMutex<()>>,
    /// Write side held by the running mutation, read side by detection
    state: Arc<RwLock<()>>,
}

/// Held while a mutation runs; dropping it releases the path
#[derive(Debug)]
pub struct MutationGuard {
    _state: OwnedRwLockWriteGuard<()>,
    _mutation: OwnedMutexGuard<()>,
}

/// One mutation gate and one read/write lock per repository path
///
/// A second mutation on a busy path is rejected without waiting. Detection
/// never causes a rejection: an accepted mutation waits for in-flight reads
/// to finish, and later reads wait for the mutation.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<PathLock>>>,
}

impl PathLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &Path) -> Arc<PathLock> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_path_buf()).or_default().clone()
    }

    /// Claim the path for a mutation, or `None` if another mutation holds it
    pub async fn try_exclusive(&self, key: &Path) -> Option<MutationGuard> {
        let lock = self.entry(key);
        let mutation = Arc::clone(&lock.mutation).try_lock_owned().ok()?;
        let state = Arc::clone(&lock.state).write_owned().await;
        Some(MutationGuard {
            _state: state,
            _mutation: mutation,
        })
    }

    /// Wait for the read side
    pub async fn shared(&self, key: &Path) -> OwnedRwLockReadGuard<()> {
        Arc::clone(&self.entry(key).state).read_owned().await
    }

    /// Whether a mutation is currently running on the path
    pub fn is_busy(&self, key: &Path) -> bool {
        self.entry(key).mutation.try_lock().is_err()
    }
}
