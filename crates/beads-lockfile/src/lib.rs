//! Workspace coordination primitives for the beads system: advisory
//! exclusive locking with liveness-by-attempt semantics, a debounced file
//! watcher with a polling fallback, a freshness checker that detects
//! wholesale file replacement, sandbox auto-detection, and path
//! normalization for cross-platform comparisons.

pub mod error;
pub mod freshness;
pub mod lock;
pub mod path;
pub mod sandbox;
pub mod watcher;

pub use error::{LockError, Result};
pub use freshness::FreshnessChecker;
pub use lock::{WorkspaceLock, DEFAULT_DEADLINE};
pub use path::{normalize, same_path};
pub use sandbox::detect_sandbox;
pub use watcher::{LogWatcher, MutationEvent, DEFAULT_DEBOUNCE, DEFAULT_POLL_INTERVAL};
