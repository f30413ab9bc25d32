//! Dependency types -- typed edges between issues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DependencyType;

/// A directed edge `(from, to, kind)` in the issue graph. Unique on the
/// full triple: a pair of issues may carry more than one edge kind at
/// once (e.g. both `parent-child` and `related`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub issue_id: String,

    pub depends_on_id: String,

    /// Dependency kind (serialised as "type" in JSON).
    #[serde(rename = "type")]
    pub dep_type: DependencyType,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,
}

/// Counts for dependencies and dependents, used by list/show views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCounts {
    /// Number of issues this issue depends on.
    pub dependency_count: i32,
    /// Number of issues that depend on this issue.
    pub dependent_count: i32,
}

/// Default keywords for the `ready.failure_keywords` config option: close
/// reasons that keep a `conditional-blocks` edge blocking. Workspaces may
/// extend this set via configuration; this is only the shipped default.
pub const DEFAULT_FAILURE_KEYWORDS: &[&str] = &["failed", "blocked", "wontfix", "cancelled"];

/// Returns `true` if `close_reason` contains any of `keywords` (matched
/// case-insensitively as substrings). Used to resolve `conditional-blocks`
/// edges: the predecessor must be closed *and* not have failed.
pub fn is_failure_close(close_reason: &str, keywords: &[String]) -> bool {
    if close_reason.is_empty() {
        return false;
    }
    let lower = close_reason.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_keywords() -> Vec<String> {
        DEFAULT_FAILURE_KEYWORDS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dependency_serde_roundtrip() {
        let dep = Dependency {
            issue_id: "bd-abc".into(),
            depends_on_id: "bd-def".into(),
            dep_type: DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: "alice".into(),
        };

        let json = serde_json::to_string(&dep).unwrap();
        assert!(json.contains(r#""type":"blocks""#));

        let back: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dep_type, DependencyType::Blocks);
        assert_eq!(back.issue_id, "bd-abc");
    }

    #[test]
    fn failure_close_detection_default_keywords() {
        let kw = default_keywords();
        assert!(is_failure_close("Build failed", &kw));
        assert!(is_failure_close("wontfix", &kw));
        assert!(is_failure_close("Cancelled by user", &kw));
        assert!(!is_failure_close("", &kw));
        assert!(!is_failure_close("Completed successfully", &kw));
    }

    #[test]
    fn failure_close_detection_custom_keywords() {
        let kw = vec!["rejected".to_string()];
        assert!(is_failure_close("REJECTED by reviewer", &kw));
        // "failed" is not in this workspace's custom set.
        assert!(!is_failure_close("Build failed", &kw));
    }
}
