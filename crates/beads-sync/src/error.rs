//! Error types for the merge resolver and sync pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to parse log at line {line}: {source}")]
    ParseError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("dependency from {from} references missing issue {to}")]
    OrphanDependency { from: String, to: String },

    #[error("store is stale relative to the on-disk log; import before continuing")]
    Stale,

    #[error("refusing to overwrite a non-empty log with an empty store (use --force)")]
    EmptyStoreOverwrite,

    #[error("cannot merge an issue into itself: {id}")]
    SelfMerge { id: String },

    #[error("merge target {id} does not exist")]
    UnknownTarget { id: String },

    /// Reserved for a future field with no resolution policy. Never
    /// constructed by this implementation.
    #[error("unmergeable conflict on field {field} for issue {id}")]
    UnmergeableConflict { id: String, field: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] beads_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
