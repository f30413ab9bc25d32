//! Advisory exclusive workspace lock with liveness-by-attempt semantics.
//!
//! PIDs are never consulted: a live peer is detected purely by the failure
//! of a non-blocking exclusive-lock attempt. A stale lock file left behind
//! by a dead process unlocks on the next attempt, since the OS releases the
//! advisory lock when the owning process exits.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{LockError, Result};

/// Default deadline for a blocking lock acquisition.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(6);

/// Poll interval while waiting for a contended lock to free up.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An acquired exclusive lock on a workspace's lock file.
///
/// The lock is released when this value is dropped.
#[derive(Debug)]
pub struct WorkspaceLock {
    file: File,
    path: PathBuf,
}

impl WorkspaceLock {
    /// Attempts to acquire the lock once, without blocking.
    ///
    /// Returns `Ok(None)` if another live process currently holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                record_holder(&file, path)?;
                Ok(Some(WorkspaceLock {
                    file,
                    path: path.to_path_buf(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(LockError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    /// Acquires the lock, retrying until `deadline` elapses.
    pub fn acquire(path: impl AsRef<Path>, deadline: Duration) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if start.elapsed() >= deadline {
                return Err(LockError::Contention {
                    path: path.display().to_string(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Tests whether a peer holding `path` is still alive, without
    /// disturbing an existing lock: a non-blocking acquisition that
    /// succeeds means the previous holder is dead, and the returned guard
    /// is immediately dropped to release it again.
    pub fn is_held_by_live_peer(path: impl AsRef<Path>) -> Result<bool> {
        Ok(Self::try_acquire(path)?.is_none())
    }

    /// Path to the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LockError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LockError::Io {
            path: path.display().to_string(),
            source: e,
        })
}

/// Records the holding process's PID for operator diagnostics only. Never
/// read back for liveness decisions.
fn record_holder(mut file: &File, path: &Path) -> Result<()> {
    file.set_len(0).map_err(|e| LockError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    writeln!(file, "{}", std::process::id()).map_err(|e| LockError::Io {
        path: path.display().to_string(),
        source: e,
    })
}
