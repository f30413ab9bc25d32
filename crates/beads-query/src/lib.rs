//! Dependency and readiness engine for the beads system.
//!
//! Pure, in-memory graph algorithms over a caller-supplied snapshot of
//! issues and dependency edges. No database access: callers pull the
//! snapshot from storage, run the query, and discard it.

pub mod error;
pub mod graph;

pub use error::{QueryError, Result};
pub use graph::{find_all_cycles, DependencyEdge, GraphSnapshot, GraphTreeNode};
