//! Field-level three-way merge and fingerprint-based duplicate resolution.
//!
//! Operates entirely on in-memory [`Issue`] values; callers are responsible
//! for fetching the relevant records from storage and persisting the result.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};

use beads_core::content_hash::fingerprint;
use beads_core::dependency::Dependency;
use beads_core::enums::Status;
use beads_core::issue::Issue;

use crate::error::{Result, SyncError};

/// Grace window added on top of the tombstone TTL before a fresh tombstone
/// loses to a live record of the same issue. Keeps a tombstone racing a
/// late-arriving update from flipping back to alive mid-sync.
pub const TOMBSTONE_GRACE: Duration = Duration::hours(1);

/// Merges two versions of the same issue against their common base.
///
/// `base` is the most recent record both sides are known to agree on, or
/// `None` if no common ancestor exists (first sync of a record created
/// independently on both sides under the same id).
pub fn merge_issue(base: Option<&Issue>, ours: &Issue, theirs: &Issue) -> Issue {
    debug_assert_eq!(ours.id, theirs.id);

    if ours.is_tombstone() != theirs.is_tombstone() {
        return tombstone_vs_live(ours, theirs);
    }

    // Exact tie falls back to a stable, arbitrary-but-deterministic tiebreak
    // so both sides converge on the same merge result.
    let newer = if theirs.updated_at > ours.updated_at {
        theirs
    } else if ours.updated_at > theirs.updated_at {
        ours
    } else if theirs.id > ours.id {
        theirs
    } else {
        ours
    };

    let mut merged = newer.clone();
    merged.created_at = ours.created_at.min(theirs.created_at);
    merged.closed_at = max_option(ours.closed_at, theirs.closed_at);
    merged.deleted_at = max_option(ours.deleted_at, theirs.deleted_at);
    merged.labels = union_labels(&ours.labels, &theirs.labels, base.map(|b| b.labels.as_slice()));
    merged.dependencies = union_dependencies(
        &ours.dependencies,
        &theirs.dependencies,
        base.map(|b| b.dependencies.as_slice()),
    );
    merged
}

fn max_option<T: Ord + Copy>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Resolves a conflict between a tombstoned version and a live version of
/// the same issue.
///
/// A tombstone younger than the tombstone retention window (plus a grace
/// period) wins outright. A tombstone older than that window has expired:
/// the live record wins and the issue is effectively resurrected. Exact
/// ties go to whichever side has the later `updated_at`.
pub fn tombstone_vs_live(a: &Issue, b: &Issue) -> Issue {
    let (tombstone, live) = if a.is_tombstone() {
        (a, b)
    } else {
        (b, a)
    };
    debug_assert!(!live.is_tombstone());

    tombstone_vs_live_with_ttl(tombstone, live, default_tombstone_ttl())
}

fn tombstone_vs_live_with_ttl(tombstone: &Issue, live: &Issue, ttl: Duration) -> Issue {
    let expired = tombstone
        .deleted_at
        .map(|deleted_at| Utc::now() - deleted_at > ttl + TOMBSTONE_GRACE)
        .unwrap_or(false);

    if expired {
        live.clone()
    } else if live.updated_at > tombstone.updated_at {
        live.clone()
    } else {
        tombstone.clone()
    }
}

fn default_tombstone_ttl() -> Duration {
    Duration::days(30)
}

fn union_labels(ours: &[String], theirs: &[String], base: Option<&[String]>) -> Vec<String> {
    let base_set: HashSet<&str> = base
        .unwrap_or(&[])
        .iter()
        .map(String::as_str)
        .collect();
    let ours_set: HashSet<&str> = ours.iter().map(String::as_str).collect();
    let theirs_set: HashSet<&str> = theirs.iter().map(String::as_str).collect();

    let mut result: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for label in ours.iter().chain(theirs.iter()) {
        if seen.contains(label.as_str()) {
            continue;
        }
        let removed_by_ours = base_set.contains(label.as_str()) && !ours_set.contains(label.as_str());
        let removed_by_theirs =
            base_set.contains(label.as_str()) && !theirs_set.contains(label.as_str());
        if removed_by_ours || removed_by_theirs {
            continue;
        }
        seen.insert(label.as_str());
        result.push(label.clone());
    }
    result.sort();
    result
}

fn dependency_key(dep: &Dependency) -> (String, String, String) {
    (
        dep.issue_id.clone(),
        dep.depends_on_id.clone(),
        dep.dep_type.as_str().to_string(),
    )
}

fn union_dependencies(
    ours: &[Dependency],
    theirs: &[Dependency],
    base: Option<&[Dependency]>,
) -> Vec<Dependency> {
    let base_keys: HashSet<(String, String, String)> = base
        .unwrap_or(&[])
        .iter()
        .map(dependency_key)
        .collect();
    let ours_keys: HashSet<(String, String, String)> = ours.iter().map(dependency_key).collect();
    let theirs_keys: HashSet<(String, String, String)> =
        theirs.iter().map(dependency_key).collect();

    let mut result = Vec::new();
    let mut seen = HashSet::new();
    for dep in ours.iter().chain(theirs.iter()) {
        let key = dependency_key(dep);
        if seen.contains(&key) {
            continue;
        }
        let removed_by_ours = base_keys.contains(&key) && !ours_keys.contains(&key);
        let removed_by_theirs = base_keys.contains(&key) && !theirs_keys.contains(&key);
        if removed_by_ours || removed_by_theirs {
            continue;
        }
        seen.insert(key);
        result.push(dep.clone());
    }
    result
}

// ---------------------------------------------------------------------------
// Duplicate detection and merge
// ---------------------------------------------------------------------------

/// A group of issues sharing a content fingerprint and status class.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// The issue chosen as the merge target.
    pub target: String,
    /// The remaining issues in the group, to be merged into `target`.
    pub sources: Vec<String>,
}

fn status_class(status: Status) -> &'static str {
    if status.is_terminal() {
        "terminal"
    } else {
        "active"
    }
}

/// Groups issues by content fingerprint within the same status class
/// (terminal vs. active), identifying sets of likely duplicates.
///
/// The merge target within a group is the issue with the most incoming
/// dependency references (`reference_counts`), breaking ties by the
/// lexicographically smallest id.
pub fn find_duplicates(
    issues: &[Issue],
    reference_counts: &HashMap<String, usize>,
) -> Vec<DuplicateGroup> {
    let mut groups: HashMap<(String, &'static str), Vec<&Issue>> = HashMap::new();
    for issue in issues {
        if issue.is_tombstone() {
            continue;
        }
        let key = (fingerprint(issue), status_class(issue.status.clone()));
        groups.entry(key).or_default().push(issue);
    }

    let mut out = Vec::new();
    for (_, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| {
            let ra = reference_counts.get(&a.id).copied().unwrap_or(0);
            let rb = reference_counts.get(&b.id).copied().unwrap_or(0);
            rb.cmp(&ra).then_with(|| a.id.cmp(&b.id))
        });
        let target = members[0].id.clone();
        let sources = members[1..].iter().map(|i| i.id.clone()).collect();
        out.push(DuplicateGroup { target, sources });
    }
    out.sort_by(|a, b| a.target.cmp(&b.target));
    out
}

/// The result of merging one issue into another: the closed source, the
/// dependency edges to redirect, and the text fields on other issues that
/// mention the source id and should be rewritten to the target id.
#[derive(Debug, Clone)]
pub struct MergePlan {
    pub source_id: String,
    pub target_id: String,
    pub close_reason: String,
    pub redirected_dependencies: Vec<Dependency>,
}

/// Plans a merge of `source` into `target`.
///
/// Redirects every dependency edge touching `source` so it instead touches
/// `target`, skipping any that would become a self-loop (source and target
/// were already linked to each other directly).
pub fn plan_merge(
    source: &Issue,
    target: &Issue,
    edges_touching_source: &[Dependency],
) -> Result<MergePlan> {
    if source.id == target.id {
        return Err(SyncError::SelfMerge {
            id: source.id.clone(),
        });
    }

    let mut redirected = Vec::new();
    for dep in edges_touching_source {
        let mut dep = dep.clone();
        if dep.issue_id == source.id {
            dep.issue_id = target.id.clone();
        }
        if dep.depends_on_id == source.id {
            dep.depends_on_id = target.id.clone();
        }
        if dep.issue_id == dep.depends_on_id {
            continue;
        }
        redirected.push(dep);
    }

    Ok(MergePlan {
        source_id: source.id.clone(),
        target_id: target.id.clone(),
        close_reason: format!("Merged into {}", target.id),
        redirected_dependencies: redirected,
    })
}

/// Rewrites textual references to `source_id` as `target_id` across the
/// given fields, returning the updated strings (or `None` if unchanged).
pub fn rewrite_references(text: &str, source_id: &str, target_id: &str) -> Option<String> {
    if text.contains(source_id) {
        Some(text.replace(source_id, target_id))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::issue::IssueBuilder;

    fn issue(id: &str) -> Issue {
        IssueBuilder::new("Title").id(id).build()
    }

    #[test]
    fn merge_prefers_newer_updated_at() {
        let mut ours = issue("bd-1");
        let mut theirs = issue("bd-1");
        ours.updated_at = Utc::now();
        theirs.updated_at = ours.updated_at - Duration::seconds(10);
        ours.title = "ours".into();
        theirs.title = "theirs".into();

        let merged = merge_issue(None, &ours, &theirs);
        assert_eq!(merged.title, "ours");
    }

    #[test]
    fn merge_unions_labels_minus_base_removals() {
        let base = {
            let mut i = issue("bd-1");
            i.labels = vec!["a".into(), "b".into()];
            i
        };
        let mut ours = issue("bd-1");
        ours.labels = vec!["b".into(), "c".into()]; // dropped "a"
        ours.updated_at = Utc::now();
        let mut theirs = issue("bd-1");
        theirs.labels = vec!["a".into(), "b".into(), "d".into()];
        theirs.updated_at = ours.updated_at - Duration::seconds(5);

        let merged = merge_issue(Some(&base), &ours, &theirs);
        let mut labels = merged.labels.clone();
        labels.sort();
        assert_eq!(labels, vec!["b".to_string(), "c".to_string(), "d".to_string()]);
    }

    #[test]
    fn fresh_tombstone_beats_live() {
        let mut tombstone = issue("bd-1");
        tombstone.status = Status::Tombstone;
        tombstone.deleted_at = Some(Utc::now());
        tombstone.updated_at = Utc::now();

        let mut live = issue("bd-1");
        live.updated_at = tombstone.updated_at - Duration::minutes(5);

        let resolved = tombstone_vs_live(&tombstone, &live);
        assert!(resolved.is_tombstone());
    }

    #[test]
    fn expired_tombstone_resurrects_live() {
        let mut tombstone = issue("bd-1");
        tombstone.status = Status::Tombstone;
        tombstone.deleted_at = Some(Utc::now() - Duration::days(400));
        tombstone.updated_at = tombstone.deleted_at.unwrap();

        let mut live = issue("bd-1");
        live.updated_at = Utc::now() - Duration::days(1);

        let resolved = tombstone_vs_live(&tombstone, &live);
        assert!(!resolved.is_tombstone());
    }

    #[test]
    fn find_duplicates_groups_by_fingerprint_and_status() {
        let mut a = issue("bd-1");
        a.description = "same body".into();
        let mut b = issue("bd-2");
        b.description = "same body".into();
        let mut c = issue("bd-3");
        c.description = "different body".into();

        let mut refs = HashMap::new();
        refs.insert("bd-2".to_string(), 3usize);

        let groups = find_duplicates(&[a, b, c], &refs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].target, "bd-2");
        assert_eq!(groups[0].sources, vec!["bd-1".to_string()]);
    }

    #[test]
    fn plan_merge_rejects_self_merge() {
        let i = issue("bd-1");
        let err = plan_merge(&i, &i, &[]).unwrap_err();
        assert!(matches!(err, SyncError::SelfMerge { .. }));
    }

    #[test]
    fn plan_merge_redirects_edges_and_drops_self_loops() {
        let source = issue("bd-1");
        let target = issue("bd-2");
        let edges = vec![
            Dependency {
                issue_id: "bd-3".into(),
                depends_on_id: "bd-1".into(),
                dep_type: beads_core::enums::DependencyType::Blocks,
                created_at: Utc::now(),
                created_by: String::new(),
            },
            Dependency {
                issue_id: "bd-1".into(),
                depends_on_id: "bd-2".into(),
                dep_type: beads_core::enums::DependencyType::Blocks,
                created_at: Utc::now(),
                created_by: String::new(),
            },
        ];

        let plan = plan_merge(&source, &target, &edges).unwrap();
        assert_eq!(plan.redirected_dependencies.len(), 1);
        assert_eq!(plan.redirected_dependencies[0].issue_id, "bd-3");
        assert_eq!(plan.redirected_dependencies[0].depends_on_id, "bd-2");
    }

    #[test]
    fn rewrite_references_replaces_mentions() {
        let text = "see bd-1 for context";
        assert_eq!(
            rewrite_references(text, "bd-1", "bd-2").unwrap(),
            "see bd-2 for context"
        );
        assert!(rewrite_references(text, "bd-9", "bd-2").is_none());
    }
}
