//! Pure in-memory dependency graph operations.
//!
//! Everything here operates over a caller-supplied snapshot (`&[Issue]` +
//! `&[Dependency]`) pulled from storage -- no database access, so the
//! algorithmic core is testable without a connection.

use std::collections::{HashMap, HashSet, VecDeque};

use beads_core::dependency::{is_failure_close, Dependency};
use beads_core::enums::{DependencyType, Status};
use beads_core::filter::ReadyFilter;
use beads_core::issue::Issue;

use crate::error::{QueryError, Result};

/// A directed edge in the dependency graph, as referenced by id rather than
/// by borrowed `Issue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: DependencyType,
}

impl From<&Dependency> for DependencyEdge {
    fn from(dep: &Dependency) -> Self {
        Self {
            from: dep.issue_id.clone(),
            to: dep.depends_on_id.clone(),
            kind: dep.dep_type.clone(),
        }
    }
}

/// A node visited during a dependency-tree traversal.
#[derive(Debug, Clone)]
pub struct GraphTreeNode {
    pub issue_id: String,
    pub depth: i32,
    pub dep_type: DependencyType,
    pub reverse: bool,
}

/// A snapshot of the issue/dependency graph, indexed for repeated queries.
///
/// Construct once per logical operation (readiness check, cycle audit,
/// tree view) from storage-fetched vectors; cheap to build, not intended
/// to be held across mutations.
pub struct GraphSnapshot<'a> {
    issues_by_id: HashMap<&'a str, &'a Issue>,
    /// Outgoing edges, keyed by `from`.
    outgoing: HashMap<&'a str, Vec<&'a Dependency>>,
    /// Incoming edges, keyed by `to`.
    incoming: HashMap<&'a str, Vec<&'a Dependency>>,
}

impl<'a> GraphSnapshot<'a> {
    pub fn new(issues: &'a [Issue], dependencies: &'a [Dependency]) -> Self {
        let mut issues_by_id = HashMap::with_capacity(issues.len());
        for issue in issues {
            issues_by_id.insert(issue.id.as_str(), issue);
        }

        let mut outgoing: HashMap<&str, Vec<&Dependency>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&Dependency>> = HashMap::new();
        for dep in dependencies {
            outgoing.entry(dep.issue_id.as_str()).or_default().push(dep);
            incoming
                .entry(dep.depends_on_id.as_str())
                .or_default()
                .push(dep);
        }

        Self {
            issues_by_id,
            outgoing,
            incoming,
        }
    }

    pub fn issue(&self, id: &str) -> Option<&'a Issue> {
        self.issues_by_id.get(id).copied()
    }

    fn outgoing_ready_blocking(&self, id: &str) -> impl Iterator<Item = &'a Dependency> + '_ {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter(|d| d.dep_type.affects_ready_work())
            .copied()
    }

    /// Returns `true` if `blocker_id`'s edge of kind `kind` no longer holds
    /// `dependent` back: either the blocker is closed/tombstoned (non-
    /// conditional kinds), or it closed without a failure-matching reason
    /// (conditional-blocks).
    fn edge_resolved(&self, blocker: &Issue, kind: &DependencyType, keywords: &[String]) -> bool {
        match kind {
            DependencyType::ConditionalBlocks => {
                blocker.status == Status::Closed
                    && !is_failure_close(&blocker.close_reason, keywords)
            }
            _ => matches!(blocker.status, Status::Closed | Status::Tombstone),
        }
    }

    /// Returns `true` if `issue_id` is currently ready: every ready-blocking
    /// outgoing edge is resolved.
    pub fn is_ready(&self, issue_id: &str, keywords: &[String]) -> Result<bool> {
        let issue = self
            .issue(issue_id)
            .ok_or_else(|| QueryError::MissingEndpoint {
                id: issue_id.to_string(),
            })?;
        if matches!(issue.status, Status::Closed | Status::Tombstone) {
            return Ok(false);
        }

        for dep in self.outgoing_ready_blocking(issue_id) {
            let blocker =
                self.issue(&dep.depends_on_id)
                    .ok_or_else(|| QueryError::MissingEndpoint {
                        id: dep.depends_on_id.clone(),
                    })?;
            if !self.edge_resolved(blocker, &dep.dep_type, keywords) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Kahn-style ready-set computation: every issue whose ready-blocking
    /// edges are all resolved, filtered and ordered per `filter`.
    ///
    /// Result order: priority ascending, `updated_at` descending, id as a
    /// stable tie-break.
    pub fn ready_work(&self, filter: &ReadyFilter, keywords: &[String]) -> Result<Vec<&'a Issue>> {
        let mut ready = Vec::new();
        for (&id, &issue) in &self.issues_by_id {
            if !matches!(issue.status, Status::Open | Status::InProgress | Status::Blocked) {
                continue;
            }
            if !matches_ready_filter(issue, filter) {
                continue;
            }
            if self.is_ready(id, keywords)? {
                ready.push(issue);
            }
        }

        ready.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        if let Some(limit) = filter.limit {
            ready.truncate(limit.max(0) as usize);
        }

        Ok(ready)
    }

    /// Reverse traversal: the open/unsatisfied ready-blocking predecessors
    /// of `issue_id`.
    pub fn blockers(&self, issue_id: &str, keywords: &[String]) -> Result<Vec<&'a Issue>> {
        if self.issue(issue_id).is_none() {
            return Err(QueryError::MissingEndpoint {
                id: issue_id.to_string(),
            });
        }

        let mut result = Vec::new();
        for dep in self.outgoing_ready_blocking(issue_id) {
            let blocker =
                self.issue(&dep.depends_on_id)
                    .ok_or_else(|| QueryError::MissingEndpoint {
                        id: dep.depends_on_id.clone(),
                    })?;
            if !self.edge_resolved(blocker, &dep.dep_type, keywords) {
                result.push(blocker);
            }
        }
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    /// DFS bounded to the component reachable from `from`: returns the
    /// cycle (as a chain of ids ending back at `from`) that adding edge
    /// `(from, to, kind)` would create in the ready-blocking subgraph, if
    /// any. Only ready-blocking kinds participate in the acyclicity
    /// invariant; other kinds can never form a blocking cycle.
    pub fn would_create_cycle(
        &self,
        from: &str,
        to: &str,
        kind: &DependencyType,
    ) -> Option<Vec<String>> {
        if !kind.affects_ready_work() {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string(), to.to_string()]);
        }

        // A new edge from -> to creates a cycle iff `to` can already reach
        // `from` via existing ready-blocking edges.
        let mut visited: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = vec![to];
        visited.insert(to);

        let mut stack: Vec<&str> = vec![to];
        while let Some(&node) = stack.last() {
            if node == from {
                path.push(from);
                let mut chain: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                chain.push(to.to_string());
                return Some(chain);
            }

            let mut advanced = false;
            for dep in self.outgoing_ready_blocking(node) {
                let next = dep.depends_on_id.as_str();
                if visited.insert(next) {
                    path.push(next);
                    stack.push(next);
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                stack.pop();
                path.pop();
            }
        }
        None
    }

    /// Forward traversal over a caller-chosen kind (usually `parent-child`),
    /// bounded by `max_depth`, cycle-safe via visited tracking.
    pub fn tree(
        &self,
        root_id: &str,
        max_depth: i32,
        reverse: bool,
    ) -> Result<Vec<GraphTreeNode>> {
        if self.issue(root_id).is_none() {
            return Err(QueryError::MissingEndpoint {
                id: root_id.to_string(),
            });
        }

        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root_id.to_string());

        let mut queue: VecDeque<(String, i32, DependencyType)> = VecDeque::new();
        let seed_edges = if reverse {
            self.incoming.get(root_id)
        } else {
            self.outgoing.get(root_id)
        };
        for dep in seed_edges.into_iter().flatten() {
            let next_id = if reverse {
                dep.issue_id.clone()
            } else {
                dep.depends_on_id.clone()
            };
            queue.push_back((next_id, 1, dep.dep_type.clone()));
        }

        while let Some((id, depth, dep_type)) = queue.pop_front() {
            if depth > max_depth || visited.contains(&id) {
                continue;
            }
            visited.insert(id.clone());
            result.push(GraphTreeNode {
                issue_id: id.clone(),
                depth,
                dep_type,
                reverse,
            });

            let next_edges = if reverse {
                self.incoming.get(id.as_str())
            } else {
                self.outgoing.get(id.as_str())
            };
            for dep in next_edges.into_iter().flatten() {
                let next_id = if reverse {
                    dep.issue_id.clone()
                } else {
                    dep.depends_on_id.clone()
                };
                if !visited.contains(&next_id) {
                    queue.push_back((next_id, depth + 1, dep.dep_type.clone()));
                }
            }
        }

        Ok(result)
    }
}

fn matches_ready_filter(issue: &Issue, filter: &ReadyFilter) -> bool {
    if let Some(ref issue_type) = filter.issue_type {
        if &issue.issue_type != issue_type {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if issue.priority != priority {
            return false;
        }
    }
    if let Some(ref prefix) = filter.id_prefix {
        if !issue.id.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if !filter.labels.is_empty() && !filter.labels.iter().all(|l| issue.labels.contains(l)) {
        return false;
    }
    if !filter.labels_any.is_empty() && !filter.labels_any.iter().any(|l| issue.labels.contains(l))
    {
        return false;
    }
    true
}

/// Enumerates every distinct cycle in the ready-blocking subgraph of the
/// snapshot. A periodic audit operation, not required on the write path
/// (new edges are checked incrementally by [`GraphSnapshot::would_create_cycle`]);
/// this exists to catch cycles introduced by direct data repair or import.
pub fn find_all_cycles(snapshot: &GraphSnapshot<'_>) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut globally_visited: HashSet<String> = HashSet::new();

    let ids: Vec<&str> = snapshot.issues_by_id.keys().copied().collect();
    for &start in &ids {
        if globally_visited.contains(start) {
            continue;
        }

        let mut stack: Vec<String> = vec![start.to_string()];
        let mut on_stack: HashSet<String> = HashSet::new();
        on_stack.insert(start.to_string());

        dfs_find_cycles(
            snapshot,
            start,
            &mut stack,
            &mut on_stack,
            &mut globally_visited,
            &mut cycles,
        );
    }

    cycles
}

fn dfs_find_cycles(
    snapshot: &GraphSnapshot<'_>,
    node: &str,
    stack: &mut Vec<String>,
    on_stack: &mut HashSet<String>,
    globally_visited: &mut HashSet<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    globally_visited.insert(node.to_string());

    for dep in snapshot.outgoing_ready_blocking(node) {
        let next = dep.depends_on_id.as_str();
        if on_stack.contains(next) {
            // Found a cycle: the slice of `stack` from `next`'s first
            // occurrence to the end, closed back to `next`.
            if let Some(pos) = stack.iter().position(|s| s == next) {
                let mut cycle: Vec<String> = stack[pos..].to_vec();
                cycle.push(next.to_string());
                cycles.push(cycle);
            }
            continue;
        }
        if globally_visited.contains(next) {
            continue;
        }

        stack.push(next.to_string());
        on_stack.insert(next.to_string());
        dfs_find_cycles(snapshot, next, stack, on_stack, globally_visited, cycles);
        on_stack.remove(next);
        stack.pop();
    }
}
