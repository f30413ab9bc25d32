//! Issue id allocation.
//!
//! `Storage::create_issue` never generates an id itself -- callers own
//! allocation. This mirrors the adaptive-length hash scheme in
//! `beads_core::idgen`: length grows with repo size to keep collisions
//! unlikely, and a handful of nonce retries absorb the rare case where a
//! freshly generated id is already taken.

use anyhow::{Context, Result, bail};
use chrono::Utc;

use beads_core::idgen::{adaptive_defaults, compute_adaptive_length, generate_hash_id};
use beads_storage::Storage;

/// Number of nonce retries attempted before giving up on a collision.
const MAX_ATTEMPTS: i32 = 8;

/// Allocates a fresh, unused issue id under `prefix`.
///
/// `prefix` may carry a trailing hyphen (as `BeadsConfig::issue_prefix`
/// does, e.g. `"bd-"`) or not; either way the generated id has exactly one
/// hyphen between the prefix and the hash.
pub fn allocate(
    storage: &dyn Storage,
    prefix: &str,
    title: &str,
    description: &str,
    creator: &str,
) -> Result<String> {
    let prefix = prefix.trim_end_matches('-');
    let stats = storage
        .get_statistics()
        .context("failed to read issue count for id sizing")?;
    let length = compute_adaptive_length(
        stats.total_issues.max(0) as usize,
        adaptive_defaults::MIN_LENGTH,
        adaptive_defaults::MAX_LENGTH,
        adaptive_defaults::MAX_COLLISION_PROB,
    );

    let now = Utc::now();
    for nonce in 0..MAX_ATTEMPTS {
        let id = generate_hash_id(prefix, title, description, creator, now, length, nonce);
        match storage.get_issue(&id) {
            Err(_) => return Ok(id),
            Ok(_) => continue,
        }
    }

    bail!(
        "failed to allocate a unique id under prefix '{}' after {} attempts",
        prefix,
        MAX_ATTEMPTS
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_storage::SqliteStore;

    #[test]
    fn allocates_id_under_prefix() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = allocate(&store, "bd-", "Title", "", "alice").unwrap();
        assert!(id.starts_with("bd-"));
        assert!(!id.starts_with("bd--"));
    }

    #[test]
    fn retries_on_collision() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id1 = allocate(&store, "bd", "Same Title", "", "alice").unwrap();
        store
            .create_issue(
                &beads_core::issue::IssueBuilder::new("Same Title").id(id1.clone()).build(),
                "alice",
            )
            .unwrap();
        let id2 = allocate(&store, "bd", "Same Title", "", "alice").unwrap();
        assert_ne!(id1, id2);
    }
}
