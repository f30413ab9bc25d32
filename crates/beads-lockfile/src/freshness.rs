//! Freshness re-connect: detects when the underlying database file has been
//! replaced wholesale (an external tool or merge driver swapping the file
//! rather than mutating it in place) and signals the caller to reopen.
//!
//! Identity is the `(dev, ino)` pair observed at connect time, not the file
//! path or its contents -- a rename-and-replace changes the inode even when
//! the path is untouched, which is exactly the case this guards against.

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use crate::error::{LockError, Result};

/// The `(dev, ino)` identity of a file at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

#[cfg(unix)]
fn identity_of(path: &Path) -> Result<FileIdentity> {
    let meta = fs::metadata(path).map_err(|e| LockError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(FileIdentity {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn identity_of(path: &Path) -> Result<FileIdentity> {
    // No stable inode-equivalent on non-unix targets; fall back to mtime
    // and length, which still detects a wholesale file replacement.
    let meta = fs::metadata(path).map_err(|e| LockError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    Ok(FileIdentity {
        dev: meta.len(),
        ino: mtime,
    })
}

/// Watches a single file's identity for replacement.
///
/// Constructed at connect time; `changed` is called periodically (and on
/// open) to check whether the file underneath has been swapped out.
pub struct FreshnessChecker {
    path: PathBuf,
    observed: FileIdentity,
}

impl FreshnessChecker {
    /// Records the identity of the file at `path` as of now.
    pub fn observe(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let observed = identity_of(&path)?;
        Ok(Self { path, observed })
    }

    /// Returns `true` if the file's identity no longer matches the one
    /// recorded at construction (or the last successful [`Self::rebase`]).
    ///
    /// A missing file is treated as unchanged: a store mid-replacement
    /// (unlink-then-recreate) shouldn't trigger a spurious reconnect before
    /// the new file lands.
    pub fn changed(&self) -> Result<bool> {
        match identity_of(&self.path) {
            Ok(current) => Ok(current != self.observed),
            Err(_) => Ok(false),
        }
    }

    /// Re-observes the file's current identity, e.g. after the caller has
    /// closed and reopened the store against it.
    pub fn rebase(&mut self) -> Result<()> {
        self.observed = identity_of(&self.path)?;
        Ok(())
    }

    /// Path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unchanged_file_reports_no_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("beads.db");
        fs::write(&path, b"v1").unwrap();

        let checker = FreshnessChecker::observe(&path).unwrap();
        assert!(!checker.changed().unwrap());
    }

    #[test]
    fn wholesale_replacement_is_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("beads.db");
        fs::write(&path, b"v1").unwrap();

        let checker = FreshnessChecker::observe(&path).unwrap();

        // Simulate an external tool replacing the file: unlink, then create
        // a new file at the same path (a new inode on unix).
        fs::remove_file(&path).unwrap();
        fs::write(&path, b"v2").unwrap();

        assert!(checker.changed().unwrap());
    }

    #[test]
    fn in_place_content_change_keeps_same_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("beads.db");
        fs::write(&path, b"v1").unwrap();

        let checker = FreshnessChecker::observe(&path).unwrap();
        fs::write(&path, b"v1-modified-in-place").unwrap();

        assert!(!checker.changed().unwrap());
    }

    #[test]
    fn rebase_adopts_the_new_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("beads.db");
        fs::write(&path, b"v1").unwrap();

        let mut checker = FreshnessChecker::observe(&path).unwrap();
        fs::remove_file(&path).unwrap();
        fs::write(&path, b"v2").unwrap();
        assert!(checker.changed().unwrap());

        checker.rebase().unwrap();
        assert!(!checker.changed().unwrap());
    }

    #[test]
    fn missing_file_reports_unchanged_rather_than_erroring() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("beads.db");
        fs::write(&path, b"v1").unwrap();

        let checker = FreshnessChecker::observe(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(!checker.changed().unwrap());
    }
}
