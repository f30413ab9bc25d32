//! Complex queries: blocked issues, aggregate statistics.

use beads_core::dependency::is_failure_close;
use beads_core::enums::DependencyType;
use beads_core::filter::ReadyFilter;
use rusqlite::params;

use crate::error::Result;
use crate::sqlite::issues::{scan_issue, ISSUE_COLUMNS};
use crate::sqlite::store::SqliteStore;
use crate::traits::{BlockedIssue, Statistics};

/// `type IN (...)` fragment listing the ready-blocking dependency kinds.
fn ready_blocking_type_list() -> String {
    DependencyType::READY_BLOCKING
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

impl SqliteStore {
    /// Returns the configured failure-close keywords, falling back to the
    /// built-in default list if unset.
    fn failure_keywords(&self) -> Vec<String> {
        match self.get_config_impl("ready.failure_keywords") {
            Ok(v) if !v.is_empty() => v.split(',').map(|s| s.trim().to_string()).collect(),
            _ => beads_core::dependency::DEFAULT_FAILURE_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Returns `true` if `issue_id` is still held back by one of its
    /// `conditional-blocks` edges: the blocker closed, but its close reason
    /// matches a failure keyword, so the condition did not resolve.
    fn blocked_by_unresolved_condition(
        &self,
        conn: &rusqlite::Connection,
        issue_id: &str,
        keywords: &[String],
    ) -> Result<bool> {
        let mut stmt = conn.prepare(
            "SELECT blocker.close_reason
             FROM dependencies d
             INNER JOIN issues blocker ON blocker.id = d.to_id
             WHERE d.from_id = ?1 AND d.type = 'conditional-blocks' AND blocker.status = 'closed'",
        )?;
        let rows = stmt.query_map(params![issue_id], |row| row.get::<_, String>(0))?;
        for row in rows {
            let close_reason = row?;
            if is_failure_close(&close_reason, keywords) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns issues that have at least one open ready-blocking dependency,
    /// including those held back solely by an unresolved `conditional-blocks`
    /// edge (blocker closed with a failure-matching reason).
    pub fn get_blocked_issues_impl(&self, filter: &ReadyFilter) -> Result<Vec<BlockedIssue>> {
        let conn = self.lock_conn()?;
        let keywords = self.failure_keywords();
        let blocking_types = ready_blocking_type_list();

        let mut where_clauses: Vec<String> =
            vec!["i.status NOT IN ('closed', 'tombstone')".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut param_idx = 1;

        if let Some(ref issue_type) = filter.issue_type {
            where_clauses.push(format!("i.issue_type = ?{param_idx}"));
            param_values.push(Box::new(issue_type.as_str().to_string()));
            param_idx += 1;
        }
        if let Some(priority) = filter.priority {
            where_clauses.push(format!("i.priority = ?{param_idx}"));
            param_values.push(Box::new(priority));
            param_idx += 1;
        }
        let _ = param_idx;

        let where_sql = where_clauses.join(" AND ");

        let sql = format!(
            "SELECT {ISSUE_COLUMNS},
                    (SELECT COUNT(*)
                     FROM dependencies d
                     INNER JOIN issues blocker ON blocker.id = d.to_id
                     WHERE d.from_id = i.id
                       AND d.type IN ({blocking_types})
                       AND blocker.status NOT IN ('closed', 'tombstone')
                    ) AS open_blocker_count
             FROM issues i
             WHERE {where_sql}
             ORDER BY i.priority ASC, i.updated_at DESC, i.id ASC"
        );

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let issue = scan_issue(row)?;
            let open_blocker_count: i32 = row.get("open_blocker_count")?;
            Ok((issue, open_blocker_count))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        drop(stmt);

        let mut result = Vec::new();
        for (issue, open_blocker_count) in candidates {
            let blocked_by_count = if open_blocker_count > 0 {
                open_blocker_count
            } else if self.blocked_by_unresolved_condition(&conn, &issue.id, &keywords)? {
                1
            } else {
                0
            };
            if blocked_by_count > 0 {
                result.push(BlockedIssue {
                    issue,
                    blocked_by_count,
                });
            }
        }

        if let Some(limit) = filter.limit {
            result.truncate(limit.max(0) as usize);
        }

        Ok(result)
    }

    /// Returns aggregate statistics.
    pub fn get_statistics_impl(&self) -> Result<Statistics> {
        let conn = self.lock_conn()?;
        let mut stats = Statistics::default();

        stats.total_issues =
            conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        stats.open_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'open'",
            [],
            |row| row.get(0),
        )?;
        stats.closed_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'closed'",
            [],
            |row| row.get(0),
        )?;
        stats.in_progress_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'in_progress'",
            [],
            |row| row.get(0),
        )?;
        stats.blocked_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'blocked'",
            [],
            |row| row.get(0),
        )?;
        stats.tombstoned_issues = conn.query_row(
            "SELECT COUNT(*) FROM issues WHERE status = 'tombstone'",
            [],
            |row| row.get(0),
        )?;

        {
            let mut stmt = conn.prepare(
                "SELECT issue_type, COUNT(*) FROM issues GROUP BY issue_type ORDER BY COUNT(*) DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.by_type.push(row?);
            }
        }

        {
            let mut stmt = conn.prepare(
                "SELECT priority, COUNT(*) FROM issues GROUP BY priority ORDER BY priority ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.by_priority.push(row?);
            }
        }

        Ok(stats)
    }

    /// Returns `true` if the issues table has zero rows.
    pub fn is_empty_impl(&self) -> Result<bool> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    /// Permanently purges tombstones whose `deleted_at` is older than `ttl`.
    pub fn purge_tombstones_impl(
        &self,
        ttl: chrono::Duration,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<i64> {
        let conn = self.lock_conn()?;
        let cutoff = crate::sqlite::issues::format_datetime(&(now - ttl));
        let affected = conn.execute(
            "DELETE FROM issues WHERE status = 'tombstone' AND deleted_at IS NOT NULL AND deleted_at < ?1",
            rusqlite::params![cutoff],
        )?;
        Ok(affected as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::enums::Status;
    use beads_core::issue::IssueBuilder;
    use chrono::Utc;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn get_statistics() {
        let store = test_store();
        let issue1 = IssueBuilder::new("Open")
            .id("bd-st1")
            .status(Status::Open)
            .build();
        let issue2 = IssueBuilder::new("Closed")
            .id("bd-st2")
            .status(Status::Closed)
            .closed_at(Utc::now())
            .build();
        store.create_issue_impl(&issue1, "alice").unwrap();
        store.create_issue_impl(&issue2, "alice").unwrap();

        let stats = store.get_statistics_impl().unwrap();
        assert_eq!(stats.total_issues, 2);
        assert_eq!(stats.open_issues, 1);
        assert_eq!(stats.closed_issues, 1);
    }

    #[test]
    fn is_empty_reflects_issue_count() {
        let store = test_store();
        assert!(store.is_empty_impl().unwrap());
        let issue = IssueBuilder::new("One").id("bd-ie1").build();
        store.create_issue_impl(&issue, "alice").unwrap();
        assert!(!store.is_empty_impl().unwrap());
    }
}
