//! Error types for the dependency and readiness engine.

use thiserror::Error;

/// Errors produced by graph operations over an in-memory issue/dependency
/// snapshot.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Adding or traversing an edge would create (or already forms) a cycle
    /// in the ready-blocking subgraph.
    #[error("dependency cycle detected: {}", format_cycle(.cycle))]
    CycleDetected { cycle: Vec<String> },

    /// An edge refers to an id not present in the snapshot.
    #[error("dependency edge refers to unknown issue: {id}")]
    MissingEndpoint { id: String },

    /// A dependency kind string did not match any known variant.
    #[error("invalid dependency kind: {kind}")]
    InvalidKind { kind: String },
}

fn format_cycle(cycle: &[String]) -> String {
    cycle.join(" -> ")
}

pub type Result<T> = std::result::Result<T, QueryError>;
