//! Whole-store snapshots for graph queries.
//!
//! `Storage` only exposes dependency edges per-issue (`get_dependencies*`),
//! never the full edge set at once. [`beads_query::graph::GraphSnapshot`]
//! needs the complete issue and dependency lists to answer ready-work,
//! cycle, and blocker queries, so commands that need it load everything
//! once via [`load_all`] and build the snapshot locally.

use anyhow::{Context, Result};

use beads_core::dependency::Dependency;
use beads_core::enums::Status;
use beads_core::filter::IssueFilter;
use beads_core::issue::Issue;
use beads_storage::Storage;

/// Loads every non-tombstoned issue and the full set of dependency edges
/// between them.
pub fn load_all(store: &dyn Storage) -> Result<(Vec<Issue>, Vec<Dependency>)> {
    let mut filter = IssueFilter::default();
    filter.exclude_status = vec![Status::Tombstone];
    let issues = store
        .search_issues("", &filter)
        .context("failed to load issues")?;

    let mut dependencies = Vec::new();
    for issue in &issues {
        let edges = store
            .get_dependencies_with_metadata(&issue.id)
            .with_context(|| format!("failed to load dependencies for {}", issue.id))?;
        dependencies.extend(edges.into_iter().map(|e| e.dependency));
    }

    Ok((issues, dependencies))
}
