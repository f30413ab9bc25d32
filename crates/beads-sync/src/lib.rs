//! Merge resolver and JSONL sync pipeline for the beads system.
//!
//! Reconciles a SQLite-backed [`beads_storage::Storage`] against the
//! line-delimited JSON log that other clones and agents exchange, and
//! resolves field-level conflicts when both sides touched the same issue.

pub mod error;
pub mod merge;
pub mod pipeline;

pub use error::{Result, SyncError};
pub use merge::{
    find_duplicates, merge_issue, plan_merge, rewrite_references, tombstone_vs_live,
    DuplicateGroup, MergePlan,
};
pub use pipeline::{compute_digest, export, import, is_stale, ExportOptions, ImportOptions, ImportReport};
