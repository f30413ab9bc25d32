//! Sandbox auto-detection: falls back to direct mode when the process
//! cannot coordinate with peers (no file locking, no file watching).

use std::path::Path;

use crate::lock::WorkspaceLock;

/// Probes whether the workspace's coordination primitives are usable by
/// actually attempting them. A probe failure - as opposed to the expected
/// "someone else holds this" outcome - means direct mode should be used.
pub fn detect_sandbox(workspace_dir: &Path) -> bool {
    !can_lock(workspace_dir) || !can_watch(workspace_dir)
}

fn can_lock(workspace_dir: &Path) -> bool {
    let probe_path = workspace_dir.join(".sandbox-probe.lock");
    match WorkspaceLock::try_acquire(&probe_path) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe_path);
            true
        }
        Err(_) => false,
    }
}

fn can_watch(workspace_dir: &Path) -> bool {
    use notify::{RecommendedWatcher, RecursiveMode, Watcher};

    let Ok(mut watcher) = RecommendedWatcher::new(|_| {}, notify::Config::default()) else {
        return false;
    };
    watcher.watch(workspace_dir, RecursiveMode::NonRecursive).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_usable_workspace_as_non_sandboxed() {
        let dir = TempDir::new().unwrap();
        assert!(!detect_sandbox(dir.path()));
    }
}
