//! Issue struct -- the central domain model for the beads system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::enums::{IssueType, Status};

fn is_zero_priority(_p: &i32) -> bool {
    false
}

fn is_empty_vec<T>(v: &[T]) -> bool {
    v.is_empty()
}

/// Represents a trackable work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: String,

    /// Internal: SHA-256 fingerprint of the content fields -- not exported
    /// to the log (recomputed on read).
    #[serde(skip)]
    pub content_hash: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub design: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub acceptance_criteria: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(rename = "type", default, skip_serializing_if = "IssueType::is_default")]
    pub issue_type: IssueType,

    #[serde(default, skip_serializing_if = "Status::is_default")]
    pub status: Status,

    /// Priority 0-4, lower is more important. Never skipped: 0 (P0) is valid.
    #[serde(default, skip_serializing_if = "is_zero_priority")]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub dependencies: Vec<Dependency>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub close_reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub closed_by_session: String,

    // ===== Tombstone fields =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deleted_by: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delete_reason: String,

    /// The issue's type immediately before it was tombstoned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_type: Option<IssueType>,

    // ===== Spec-drift metadata (opaque to the core) =====
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_changed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub comments: Vec<crate::comment::Comment>,
}

impl Default for Issue {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            content_hash: String::new(),
            title: String::new(),
            description: String::new(),
            design: String::new(),
            acceptance_criteria: String::new(),
            notes: String::new(),
            issue_type: IssueType::Task,
            status: Status::Open,
            priority: 0,
            labels: Vec::new(),
            dependencies: Vec::new(),
            created_at: now,
            created_by: String::new(),
            updated_at: now,
            closed_at: None,
            close_reason: String::new(),
            closed_by_session: String::new(),
            deleted_at: None,
            deleted_by: String::new(),
            delete_reason: String::new(),
            original_type: None,
            spec_id: String::new(),
            spec_changed_at: None,
            external_ref: None,
            comments: Vec::new(),
        }
    }
}

impl Issue {
    /// Applies default values for fields omitted during JSONL import:
    /// status defaults to Open, type defaults to Task, when the
    /// deserialized value was the empty-string custom variant.
    pub fn set_defaults(&mut self) {
        if self.status == Status::Custom(String::new()) || self.status.as_str().is_empty() {
            self.status = Status::Open;
        }
        if self.issue_type == IssueType::Custom(String::new())
            || self.issue_type.as_str().is_empty()
        {
            self.issue_type = IssueType::Task;
        }
    }

    /// Returns `true` if this issue is a tombstone (deleted, in-place).
    pub fn is_tombstone(&self) -> bool {
        self.status == Status::Tombstone
    }

    /// Transitions this issue into a tombstone: records deletion metadata,
    /// remembers the pre-deletion type, and clears outgoing dependencies
    /// (per the invariant that a tombstone has none).
    pub fn tombstone(&mut self, deleted_by: impl Into<String>, reason: impl Into<String>, at: DateTime<Utc>) {
        self.original_type = Some(self.issue_type.clone());
        self.status = Status::Tombstone;
        self.deleted_at = Some(at);
        self.deleted_by = deleted_by.into();
        self.delete_reason = reason.into();
        self.updated_at = at;
        self.dependencies.clear();
    }
}

/// Builder for constructing an [`Issue`] with a fluent API.
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    /// Creates a new builder with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let mut issue = Issue::default();
        issue.title = title.into();
        Self { issue }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.issue.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = description.into();
        self
    }

    pub fn design(mut self, design: impl Into<String>) -> Self {
        self.issue.design = design.into();
        self
    }

    pub fn acceptance_criteria(mut self, ac: impl Into<String>) -> Self {
        self.issue.acceptance_criteria = ac.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.issue.notes = notes.into();
        self
    }

    pub fn spec_id(mut self, spec_id: impl Into<String>) -> Self {
        self.issue.spec_id = spec_id.into();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.issue.status = status;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.issue.priority = priority;
        self
    }

    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue.issue_type = issue_type;
        self
    }

    pub fn created_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.created_at = t;
        self
    }

    pub fn created_by(mut self, by: impl Into<String>) -> Self {
        self.issue.created_by = by.into();
        self
    }

    pub fn updated_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.updated_at = t;
        self
    }

    pub fn closed_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.closed_at = Some(t);
        self
    }

    pub fn close_reason(mut self, reason: impl Into<String>) -> Self {
        self.issue.close_reason = reason.into();
        self
    }

    pub fn closed_by_session(mut self, session: impl Into<String>) -> Self {
        self.issue.closed_by_session = session.into();
        self
    }

    pub fn external_ref(mut self, ext: impl Into<String>) -> Self {
        self.issue.external_ref = Some(ext.into());
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.issue.labels = labels;
        self
    }

    pub fn dependencies(mut self, deps: Vec<Dependency>) -> Self {
        self.issue.dependencies = deps;
        self
    }

    /// Consumes the builder and returns the constructed [`Issue`].
    pub fn build(self) -> Issue {
        self.issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_issue() {
        let issue = Issue::default();
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.issue_type, IssueType::Task);
        assert_eq!(issue.priority, 0);
    }

    #[test]
    fn builder_basic() {
        let issue = IssueBuilder::new("Fix the bug")
            .priority(2)
            .status(Status::InProgress)
            .issue_type(IssueType::Bug)
            .build();

        assert_eq!(issue.title, "Fix the bug");
        assert_eq!(issue.priority, 2);
        assert_eq!(issue.status, Status::InProgress);
        assert_eq!(issue.issue_type, IssueType::Bug);
    }

    #[test]
    fn issue_serde_roundtrip() {
        let issue = IssueBuilder::new("Test issue")
            .id("bd-abc123")
            .priority(1)
            .description("A test description")
            .build();

        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();

        assert_eq!(back.title, "Test issue");
        assert_eq!(back.id, "bd-abc123");
        assert_eq!(back.priority, 1);
        assert_eq!(back.description, "A test description");
    }

    #[test]
    fn issue_set_defaults() {
        let json = r#"{"title": "hello"}"#;
        let mut issue: Issue = serde_json::from_str(json).unwrap();
        issue.set_defaults();
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.issue_type, IssueType::Task);
    }

    #[test]
    fn tombstone_transition_clears_dependencies() {
        let mut issue = IssueBuilder::new("Doomed")
            .issue_type(IssueType::Bug)
            .dependencies(vec![])
            .build();
        issue.dependencies.push(Dependency {
            issue_id: issue.id.clone(),
            depends_on_id: "bd-other".into(),
            dep_type: crate::enums::DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: String::new(),
        });

        let now = Utc::now();
        issue.tombstone("alice", "no longer needed", now);

        assert!(issue.is_tombstone());
        assert_eq!(issue.status, Status::Tombstone);
        assert_eq!(issue.original_type, Some(IssueType::Bug));
        assert_eq!(issue.deleted_by, "alice");
        assert_eq!(issue.deleted_at, Some(now));
        assert!(issue.dependencies.is_empty());
    }
}
