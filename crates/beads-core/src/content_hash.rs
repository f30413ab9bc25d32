//! Content fingerprinting for duplicate detection.
//!
//! `fingerprint` hashes the normalized text fields of an issue (title,
//! description, design, acceptance_criteria) so that two issues with the
//! same substantive content hash identically regardless of id, status, or
//! timestamps. Used by the dedup/merge pass in `beads-sync`.

use sha2::{Digest, Sha256};

use crate::issue::Issue;

const SEP: u8 = 0;

/// Normalizes a text field for fingerprinting: trims leading/trailing
/// whitespace and collapses CRLF/CR into LF.
fn normalize(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Computes a stable content fingerprint over an issue's text fields.
pub fn fingerprint(issue: &Issue) -> String {
    let mut h = Sha256::new();
    for field in [
        &issue.title,
        &issue.description,
        &issue.design,
        &issue.acceptance_criteria,
    ] {
        h.update(normalize(field).as_bytes());
        h.update([SEP]);
    }
    format!("{:x}", h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueBuilder;

    #[test]
    fn fingerprint_deterministic() {
        let issue = IssueBuilder::new("Test issue")
            .description("A description")
            .priority(2)
            .build();

        assert_eq!(fingerprint(&issue), fingerprint(&issue));
        assert_eq!(fingerprint(&issue).len(), 64);
    }

    #[test]
    fn fingerprint_differs_on_title_change() {
        let issue1 = IssueBuilder::new("Title A").build();
        let issue2 = IssueBuilder::new("Title B").build();
        assert_ne!(fingerprint(&issue1), fingerprint(&issue2));
    }

    #[test]
    fn fingerprint_ignores_id_status_and_timestamps() {
        let mut issue1 = IssueBuilder::new("Same content").description("same body").build();
        let mut issue2 = IssueBuilder::new("Same content").description("same body").build();

        issue1.id = "bd-aaa".into();
        issue2.id = "bd-bbb".into();
        issue1.created_at = chrono::Utc::now();
        issue2.created_at = chrono::DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);

        assert_eq!(fingerprint(&issue1), fingerprint(&issue2));
    }

    #[test]
    fn fingerprint_normalizes_whitespace_and_line_endings() {
        let issue1 = IssueBuilder::new("T").description("line1\r\nline2").build();
        let issue2 = IssueBuilder::new("T").description("line1\nline2").build();
        assert_eq!(fingerprint(&issue1), fingerprint(&issue2));

        let issue3 = IssueBuilder::new("  T  ").build();
        let issue4 = IssueBuilder::new("T").build();
        assert_eq!(fingerprint(&issue3), fingerprint(&issue4));
    }
}
