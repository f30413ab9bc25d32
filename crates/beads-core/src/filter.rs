//! Filter types for querying issues.
//!
//! Matches the filtered-search surface named in the storage engine
//! contract: status, priority, type, label, prefix, free-text.

use chrono::{DateTime, Utc};

use crate::enums::{IssueType, Status};

/// Filter for general issue search (`Storage::search_issues`).
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub priority: Option<i32>,
    pub priority_min: Option<i32>,
    pub priority_max: Option<i32>,
    pub issue_type: Option<IssueType>,

    /// AND semantics: issue must have ALL these labels.
    pub labels: Vec<String>,
    /// OR semantics: issue must have AT LEAST ONE of these labels.
    pub labels_any: Vec<String>,

    /// Filter by id prefix (e.g. "bd-" to match "bd-abc123").
    pub id_prefix: Option<String>,

    /// Free-text search across title/description/notes.
    pub text_search: Option<String>,

    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub updated_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,

    /// Exclude issues with these statuses (e.g. always exclude tombstones
    /// unless explicitly requested).
    pub exclude_status: Vec<Status>,

    pub limit: Option<i32>,
}

/// Filter for the ready-work query (`beads-query`).
#[derive(Debug, Clone, Default)]
pub struct ReadyFilter {
    pub issue_type: Option<IssueType>,
    pub priority: Option<i32>,

    /// AND semantics: issue must have ALL these labels.
    pub labels: Vec<String>,
    /// OR semantics: issue must have AT LEAST ONE of these labels.
    pub labels_any: Vec<String>,

    pub id_prefix: Option<String>,
    pub limit: Option<i32>,
}

/// Filter for stale-issue queries: issues not updated recently.
#[derive(Debug, Clone)]
pub struct StaleFilter {
    /// Issues not updated in this many days.
    pub days: i32,
    /// Filter by status, None = all non-terminal statuses.
    pub status: Option<Status>,
    /// Maximum issues to return.
    pub limit: Option<i32>,
}

impl Default for StaleFilter {
    fn default() -> Self {
        Self {
            days: 30,
            status: None,
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_filter_defaults() {
        let f = IssueFilter::default();
        assert!(f.status.is_none());
        assert!(f.priority.is_none());
        assert!(f.labels.is_empty());
    }

    #[test]
    fn ready_filter_defaults() {
        let f = ReadyFilter::default();
        assert!(f.issue_type.is_none());
        assert!(f.labels_any.is_empty());
    }

    #[test]
    fn stale_filter_defaults() {
        let f = StaleFilter::default();
        assert_eq!(f.days, 30);
        assert!(f.status.is_none());
    }
}
