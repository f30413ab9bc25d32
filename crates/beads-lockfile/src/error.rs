//! Error types for workspace locking and file watching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    /// The exclusive lock could not be acquired before the deadline elapsed;
    /// another live process holds it.
    #[error("lock contention: another process holds {path}")]
    Contention { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LockError>;
