//! Debounced watcher over the sync log, with a polling fallback for
//! filesystems where `notify` cannot initialize.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Default quiet window before a batch of file-change notifications is
/// collapsed into a single import request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default polling interval used when native file-system events are
/// unavailable.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Capacity of the bounded mutation-notification channel. Overflow is
/// tracked via `dropped_events` and should trigger a full reconcile import.
const CHANNEL_CAPACITY: usize = 512;

/// A coalesced notification that the watched log changed.
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub path: PathBuf,
}

/// Watches a single log file for mutations and emits at most one
/// [`MutationEvent`] per debounce window.
pub struct LogWatcher {
    _watcher: WatcherBackend,
    receiver: Receiver<MutationEvent>,
    dropped: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
}

enum WatcherBackend {
    Native(RecommendedWatcher),
    Polling(JoinHandle<()>),
}

impl LogWatcher {
    /// Starts watching `path`, preferring native file-system events and
    /// falling back to polling at `poll_interval` if the watcher cannot
    /// initialize (e.g. on an unusual filesystem).
    pub fn start(path: impl AsRef<Path>, debounce: Duration, poll_interval: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let stop = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));
        let (out_tx, out_rx) = sync_channel(CHANNEL_CAPACITY);

        let backend = match Self::try_native(&path, debounce, out_tx.clone(), dropped.clone()) {
            Ok(native) => WatcherBackend::Native(native),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "native file watcher unavailable, falling back to polling"
                );
                let poll_thread =
                    Self::spawn_polling(path, poll_interval, out_tx, stop.clone(), dropped.clone());
                WatcherBackend::Polling(poll_thread)
            }
        };

        LogWatcher {
            _watcher: backend,
            receiver: out_rx,
            dropped,
            stop,
        }
    }

    fn try_native(
        path: &Path,
        debounce: Duration,
        out_tx: SyncSender<MutationEvent>,
        dropped: Arc<AtomicU64>,
    ) -> notify::Result<RecommendedWatcher> {
        let (raw_tx, raw_rx) = sync_channel::<Event>(CHANNEL_CAPACITY);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    if raw_tx.try_send(event).is_err() {
                        // Channel full: a debounce cycle will still catch up.
                    }
                }
            },
            notify::Config::default(),
        )?;

        let watch_target = path.parent().unwrap_or(path);
        watcher.watch(watch_target, RecursiveMode::NonRecursive)?;

        let watched_path = path.to_path_buf();
        thread::spawn(move || debounce_loop(raw_rx, watched_path, debounce, out_tx, dropped));

        Ok(watcher)
    }

    fn spawn_polling(
        path: PathBuf,
        interval: Duration,
        out_tx: SyncSender<MutationEvent>,
        stop: Arc<AtomicBool>,
        dropped: Arc<AtomicU64>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            let mut last_seen = file_fingerprint(&path);
            while !stop.load(Ordering::Relaxed) {
                thread::sleep(interval);
                let current = file_fingerprint(&path);
                if current != last_seen {
                    last_seen = current;
                    if out_tx
                        .try_send(MutationEvent { path: path.clone() })
                        .is_err()
                    {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        })
    }

    /// Blocks until a mutation is observed or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<MutationEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of mutation notifications dropped because the bounded
    /// channel was full. A caller observing a nonzero count should trigger
    /// a full reconcile import rather than trust the event stream alone.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for LogWatcher {
    fn drop(&mut self) {
        // Dropping the native backend's `RecommendedWatcher` first (field
        // declaration order) drops its event callback's sender, which
        // unblocks the debounce thread with a `Disconnected` error. The
        // polling backend instead watches this flag directly.
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn debounce_loop(
    raw_rx: Receiver<Event>,
    path: PathBuf,
    debounce: Duration,
    out_tx: SyncSender<MutationEvent>,
    dropped: Arc<AtomicU64>,
) {
    let mut pending = false;
    let mut last_event = Instant::now();

    loop {
        let wait = if pending {
            debounce.saturating_sub(last_event.elapsed())
        } else {
            Duration::from_secs(3600)
        };

        match raw_rx.recv_timeout(wait) {
            Ok(event) => {
                if event.paths.iter().any(|p| paths_match(p, &path)) {
                    pending = true;
                    last_event = Instant::now();
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending && last_event.elapsed() >= debounce {
                    pending = false;
                    if out_tx
                        .try_send(MutationEvent { path: path.clone() })
                        .is_err()
                    {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn paths_match(a: &Path, b: &Path) -> bool {
    a == b || a.file_name() == b.file_name()
}

fn file_fingerprint(path: &Path) -> Option<(u64, std::time::SystemTime)> {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.len(), meta.modified().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn polling_fallback_detects_mutation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.jsonl");
        fs::write(&path, "{}\n").unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));
        let (tx, rx) = sync_channel(CHANNEL_CAPACITY);
        let handle = LogWatcher::spawn_polling(
            path.clone(),
            Duration::from_millis(50),
            tx,
            stop.clone(),
            dropped,
        );

        thread::sleep(Duration::from_millis(80));
        fs::write(&path, "{}\n{}\n").unwrap();

        let event = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(event.path, path);

        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();
    }
}
