//! Issue validation rules, applied at the boundary (creation/update/import)
//! so that internal operations can assume well-formed values.

use crate::enums::Status;
use crate::issue::Issue;

/// Error type for validation failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title must be 500 characters or less (got {0})")]
    TitleTooLong(usize),

    #[error("priority must be between 0 and 4 (got {0})")]
    InvalidPriority(i32),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid issue type: {0}")]
    InvalidIssueType(String),

    #[error("closed issues must have a closed_at timestamp")]
    ClosedWithoutTimestamp,

    #[error("non-closed issues cannot have a closed_at timestamp")]
    NotClosedWithTimestamp,

    #[error("tombstones must have deleted_at >= created_at")]
    TombstoneBeforeCreation,
}

/// Validates an issue using built-in rules only.
pub fn validate(issue: &Issue) -> Result<(), ValidationError> {
    validate_with_custom(issue, &[], &[])
}

/// Validates an issue, allowing custom statuses.
pub fn validate_with_custom_statuses(
    issue: &Issue,
    custom_statuses: &[&str],
) -> Result<(), ValidationError> {
    validate_with_custom(issue, custom_statuses, &[])
}

/// Validates an issue, allowing custom statuses and types. Same rules
/// apply on import: there is no separate federation trust model, since
/// the core is single-workspace.
pub fn validate_with_custom(
    issue: &Issue,
    custom_statuses: &[&str],
    custom_types: &[&str],
) -> Result<(), ValidationError> {
    if issue.title.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if issue.title.len() > 500 {
        return Err(ValidationError::TitleTooLong(issue.title.len()));
    }
    if !(0..=4).contains(&issue.priority) {
        return Err(ValidationError::InvalidPriority(issue.priority));
    }
    if !issue.status.is_valid_with_custom(custom_statuses) {
        return Err(ValidationError::InvalidStatus(
            issue.status.as_str().to_owned(),
        ));
    }
    if !issue.issue_type.is_valid_with_custom(custom_types) {
        return Err(ValidationError::InvalidIssueType(
            issue.issue_type.as_str().to_owned(),
        ));
    }
    if issue.status == Status::Closed && issue.closed_at.is_none() {
        return Err(ValidationError::ClosedWithoutTimestamp);
    }
    if issue.status != Status::Closed && issue.status != Status::Tombstone && issue.closed_at.is_some() {
        return Err(ValidationError::NotClosedWithTimestamp);
    }
    if issue.status == Status::Tombstone {
        if let Some(deleted_at) = issue.deleted_at {
            if deleted_at < issue.created_at {
                return Err(ValidationError::TombstoneBeforeCreation);
            }
        }
    }

    Ok(())
}

/// Validates an issue parsed from the external log during import. Same
/// rules as `validate_with_custom`; kept as a distinct entry point because
/// import sees records this workspace didn't create and may want a
/// different custom-type/status allowlist than interactive creation does.
pub fn validate_for_import(issue: &Issue, custom_statuses: &[&str]) -> Result<(), ValidationError> {
    validate_with_custom(issue, custom_statuses, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{IssueType, Status};
    use crate::issue::IssueBuilder;

    #[test]
    fn valid_issue_passes() {
        let issue = IssueBuilder::new("Valid issue").priority(2).build();
        assert!(validate(&issue).is_ok());
    }

    #[test]
    fn empty_title_fails() {
        let issue = IssueBuilder::new("").build();
        assert_eq!(validate(&issue), Err(ValidationError::TitleRequired));
    }

    #[test]
    fn long_title_fails() {
        let title = "x".repeat(501);
        let issue = IssueBuilder::new(title).build();
        assert_eq!(validate(&issue), Err(ValidationError::TitleTooLong(501)));
    }

    #[test]
    fn invalid_priority_fails() {
        let issue = IssueBuilder::new("Test").priority(5).build();
        assert_eq!(validate(&issue), Err(ValidationError::InvalidPriority(5)));
    }

    #[test]
    fn negative_priority_fails() {
        let issue = IssueBuilder::new("Test").priority(-1).build();
        assert_eq!(validate(&issue), Err(ValidationError::InvalidPriority(-1)));
    }

    #[test]
    fn custom_status_rejected_without_config() {
        let issue = IssueBuilder::new("Test")
            .status(Status::Custom("my_status".into()))
            .build();
        assert!(matches!(
            validate(&issue),
            Err(ValidationError::InvalidStatus(_))
        ));
    }

    #[test]
    fn custom_status_accepted_with_config() {
        let issue = IssueBuilder::new("Test")
            .status(Status::Custom("my_status".into()))
            .build();
        assert!(validate_with_custom_statuses(&issue, &["my_status"]).is_ok());
    }

    #[test]
    fn custom_type_rejected_without_config() {
        let issue = IssueBuilder::new("Test")
            .issue_type(IssueType::Custom("my_type".into()))
            .build();
        assert!(matches!(
            validate(&issue),
            Err(ValidationError::InvalidIssueType(_))
        ));
    }

    #[test]
    fn custom_type_accepted_with_config() {
        let issue = IssueBuilder::new("Test")
            .issue_type(IssueType::Custom("my_type".into()))
            .build();
        assert!(validate_with_custom(&issue, &[], &["my_type"]).is_ok());
    }

    #[test]
    fn closed_without_timestamp_fails() {
        let issue = IssueBuilder::new("Test").status(Status::Closed).build();
        assert_eq!(validate(&issue), Err(ValidationError::ClosedWithoutTimestamp));
    }

    #[test]
    fn closed_with_timestamp_passes() {
        let issue = IssueBuilder::new("Test")
            .status(Status::Closed)
            .closed_at(chrono::Utc::now())
            .build();
        assert!(validate(&issue).is_ok());
    }

    #[test]
    fn not_closed_with_timestamp_fails() {
        let issue = IssueBuilder::new("Test")
            .status(Status::Open)
            .closed_at(chrono::Utc::now())
            .build();
        assert_eq!(validate(&issue), Err(ValidationError::NotClosedWithTimestamp));
    }

    #[test]
    fn tombstone_before_creation_fails() {
        let mut issue = IssueBuilder::new("Test").status(Status::Tombstone).build();
        issue.created_at = chrono::Utc::now();
        issue.deleted_at = Some(issue.created_at - chrono::Duration::days(1));
        assert_eq!(validate(&issue), Err(ValidationError::TombstoneBeforeCreation));
    }
}
