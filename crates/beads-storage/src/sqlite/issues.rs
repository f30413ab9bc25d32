//! Issue CRUD operations for [`SqliteStore`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use beads_core::content_hash::fingerprint;
use beads_core::enums::{EventType, IssueType, Status};
use beads_core::filter::IssueFilter;
use beads_core::issue::Issue;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::traits::IssueUpdates;

// ---------------------------------------------------------------------------
// Column list (shared between INSERT and SELECT)
// ---------------------------------------------------------------------------

/// All issue columns in a deterministic order for SELECT queries.
pub(crate) const ISSUE_COLUMNS: &str = r#"
    id, content_hash, title, description, design, acceptance_criteria, notes,
    status, priority, issue_type,
    created_at, created_by, updated_at, closed_at, close_reason, closed_by_session,
    deleted_at, deleted_by, delete_reason, original_type,
    spec_id, spec_changed_at, external_ref
"#;

/// Same as [`ISSUE_COLUMNS`] but prefixed with `issues.` for use in JOIN
/// queries, avoiding ambiguous column names (`created_at` also exists on
/// `dependencies`).
pub(crate) const ISSUE_COLUMNS_PREFIXED: &str = r#"
    issues.id, issues.content_hash, issues.title, issues.description, issues.design,
    issues.acceptance_criteria, issues.notes,
    issues.status, issues.priority, issues.issue_type,
    issues.created_at, issues.created_by, issues.updated_at, issues.closed_at,
    issues.close_reason, issues.closed_by_session,
    issues.deleted_at, issues.deleted_by, issues.delete_reason, issues.original_type,
    issues.spec_id, issues.spec_changed_at, issues.external_ref
"#;

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

/// Deserialises a row into an [`Issue`].
///
/// The column order MUST match [`ISSUE_COLUMNS`]. Labels, dependencies and
/// comments are not stored on the row; callers populate them separately.
pub(crate) fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let id: String = row.get("id")?;
    let content_hash: String = row.get("content_hash")?;
    let title: String = row.get("title")?;
    let description: String = row.get("description")?;
    let design: String = row.get("design")?;
    let acceptance_criteria: String = row.get("acceptance_criteria")?;
    let notes: String = row.get("notes")?;

    let status_str: String = row.get("status")?;
    let priority: i32 = row.get("priority")?;
    let issue_type_str: String = row.get("issue_type")?;

    let created_at_str: String = row.get("created_at")?;
    let created_by: String = row.get("created_by")?;
    let updated_at_str: String = row.get("updated_at")?;
    let closed_at_str: Option<String> = row.get("closed_at")?;
    let close_reason: String = row.get("close_reason")?;
    let closed_by_session: String = row.get("closed_by_session")?;

    let deleted_at_str: Option<String> = row.get("deleted_at")?;
    let deleted_by: String = row.get("deleted_by")?;
    let delete_reason: String = row.get("delete_reason")?;
    let original_type_str: Option<String> = row.get("original_type")?;

    let spec_id: String = row.get("spec_id")?;
    let spec_changed_at_str: Option<String> = row.get("spec_changed_at")?;
    let external_ref: Option<String> = row.get("external_ref")?;

    let created_at = parse_datetime(&created_at_str);
    let updated_at = parse_datetime(&updated_at_str);
    let closed_at = closed_at_str.as_deref().map(parse_datetime);
    let deleted_at = deleted_at_str.as_deref().map(parse_datetime);
    let spec_changed_at = spec_changed_at_str.as_deref().map(parse_datetime);

    Ok(Issue {
        id,
        content_hash,
        title,
        description,
        design,
        acceptance_criteria,
        notes,
        issue_type: IssueType::from(issue_type_str),
        status: Status::from(status_str),
        priority,
        labels: Vec::new(),
        dependencies: Vec::new(),
        created_at,
        created_by,
        updated_at,
        closed_at,
        close_reason,
        closed_by_session,
        deleted_at,
        deleted_by,
        delete_reason,
        original_type: original_type_str.map(IssueType::from),
        spec_id,
        spec_changed_at,
        external_ref,
        comments: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Formats a `DateTime<Utc>` as ISO 8601 TEXT for SQLite.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses an ISO 8601 TEXT string from SQLite into a `DateTime<Utc>`.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Try full RFC 3339 first, then common SQLite formats.
    s.parse::<DateTime<Utc>>().unwrap_or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ"))
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(|ndt| ndt.and_utc())
            .unwrap_or_else(|_| Utc::now())
    })
}

// ---------------------------------------------------------------------------
// Issue insert helper (shared between store and transaction)
// ---------------------------------------------------------------------------

/// Inserts a single issue into the database using the provided connection.
pub(crate) fn insert_issue(conn: &Connection, issue: &Issue, actor: &str) -> Result<()> {
    let now = Utc::now();
    let now_str = format_datetime(&now);
    let content_hash = fingerprint(issue);

    let created_at_str = format_datetime(&issue.created_at);
    let updated_at_str = format_datetime(&issue.updated_at);
    let closed_at_str = issue.closed_at.as_ref().map(format_datetime);
    let deleted_at_str = issue.deleted_at.as_ref().map(format_datetime);
    let spec_changed_at_str = issue.spec_changed_at.as_ref().map(format_datetime);
    let original_type_str = issue.original_type.as_ref().map(|t| t.as_str().to_string());

    conn.execute(
        &format!(
            "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20,
                ?21, ?22, ?23
            )"
        ),
        params![
            issue.id,                  // 1
            content_hash,               // 2
            issue.title,                // 3
            issue.description,          // 4
            issue.design,                // 5
            issue.acceptance_criteria,  // 6
            issue.notes,                 // 7
            issue.status.as_str(),      // 8
            issue.priority,              // 9
            issue.issue_type.as_str(),  // 10
            created_at_str,              // 11
            issue.created_by,            // 12
            updated_at_str,              // 13
            closed_at_str,               // 14
            issue.close_reason,          // 15
            issue.closed_by_session,     // 16
            deleted_at_str,              // 17
            issue.deleted_by,            // 18
            issue.delete_reason,         // 19
            original_type_str,           // 20
            issue.spec_id,               // 21
            spec_changed_at_str,         // 22
            issue.external_ref,          // 23
        ],
    )?;

    emit_event(
        conn,
        &issue.id,
        EventType::Created,
        actor,
        None,
        None,
        None,
        &now_str,
    )?;

    Ok(())
}

/// Emits an event row into the events table.
#[allow(clippy::too_many_arguments)]
pub(crate) fn emit_event(
    conn: &Connection,
    issue_id: &str,
    event_type: EventType,
    actor: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    comment: Option<&str>,
    created_at: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO events (issue_id, event_type, actor, old_value, new_value, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            issue_id,
            event_type.as_str(),
            actor,
            old_value,
            new_value,
            comment,
            created_at,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore issue methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Creates a single issue.
    pub fn create_issue_impl(&self, issue: &Issue, actor: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_issue(&conn, issue, actor)
    }

    /// Creates multiple issues in a single transaction.
    pub fn create_issues_impl(&self, issues: &[Issue], actor: &str) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        for issue in issues {
            insert_issue(&tx, issue, actor)?;
        }
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(())
    }

    /// Retrieves an issue by ID.
    pub fn get_issue_impl(&self, id: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        get_issue_on_conn(&conn, id)
    }

    /// Retrieves an issue by external reference.
    pub fn get_issue_by_external_ref_impl(&self, external_ref: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE external_ref = ?1");
        conn.query_row(&sql, params![external_ref], scan_issue)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StorageError::not_found("issue", format!("external_ref={external_ref}"))
                }
                other => StorageError::Query(other),
            })
    }

    /// Retrieves multiple issues by their IDs.
    pub fn get_issues_by_ids_impl(&self, ids: &[String]) -> Result<Vec<Issue>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock_conn()?;
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id IN ({placeholders})");
        let mut stmt = conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(ids.iter());
        let rows = stmt.query_map(params, scan_issue)?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }

    /// Applies partial updates to an issue.
    pub fn update_issue_impl(&self, id: &str, updates: &IssueUpdates, actor: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        update_issue_on_conn(&conn, id, updates, actor)
    }

    /// Closes an issue.
    pub fn close_issue_impl(
        &self,
        id: &str,
        reason: &str,
        actor: &str,
        session: &str,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        close_issue_on_conn(&conn, id, reason, actor, session)
    }

    /// Tombstones an issue: marks it deleted in place and clears its
    /// outgoing dependency edges, rather than removing the row.
    pub fn delete_issue_impl(&self, id: &str, deleted_by: &str, reason: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_issue_on_conn(&conn, id, deleted_by, reason)
    }

    /// Searches issues by text query and filter.
    pub fn search_issues_impl(&self, query: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        search_issues_on_conn(&conn, query, filter)
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by both SqliteStore and Transaction)
// ---------------------------------------------------------------------------

/// Retrieves a single issue by ID on the given connection.
pub(crate) fn get_issue_on_conn(conn: &Connection, id: &str) -> Result<Issue> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_issue)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id),
            other => StorageError::Query(other),
        })
}

/// Applies partial updates on the given connection.
pub(crate) fn update_issue_on_conn(
    conn: &Connection,
    id: &str,
    updates: &IssueUpdates,
    actor: &str,
) -> Result<()> {
    let now = Utc::now();
    let now_str = format_datetime(&now);

    let mut set_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    macro_rules! add_field {
        ($field:ident, $col:expr) => {
            if let Some(ref val) = updates.$field {
                set_clauses.push(format!("{} = ?", $col));
                param_values.push(Box::new(val.clone()));
            }
        };
    }

    add_field!(title, "title");
    add_field!(description, "description");
    add_field!(design, "design");
    add_field!(acceptance_criteria, "acceptance_criteria");
    add_field!(notes, "notes");
    add_field!(spec_id, "spec_id");
    add_field!(close_reason, "close_reason");
    add_field!(closed_by_session, "closed_by_session");

    if let Some(ref status) = updates.status {
        set_clauses.push("status = ?".to_string());
        param_values.push(Box::new(status.as_str().to_string()));
    }
    if let Some(ref issue_type) = updates.issue_type {
        set_clauses.push("issue_type = ?".to_string());
        param_values.push(Box::new(issue_type.as_str().to_string()));
    }
    if let Some(priority) = updates.priority {
        set_clauses.push("priority = ?".to_string());
        param_values.push(Box::new(priority));
    }
    if let Some(ref ext) = updates.external_ref {
        set_clauses.push("external_ref = ?".to_string());
        param_values.push(Box::new(ext.clone()));
    }

    if set_clauses.is_empty() {
        return Ok(()); // Nothing to update.
    }

    set_clauses.push("updated_at = ?".to_string());
    param_values.push(Box::new(now_str.clone()));

    let sql = format!("UPDATE issues SET {} WHERE id = ?", set_clauses.join(", "));
    param_values.push(Box::new(id.to_string()));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();

    let affected = conn.execute(&sql, param_refs.as_slice())?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id));
    }

    emit_event(
        conn,
        id,
        EventType::Updated,
        actor,
        None,
        None,
        None,
        &now_str,
    )?;

    Ok(())
}

/// Closes an issue on the given connection.
pub(crate) fn close_issue_on_conn(
    conn: &Connection,
    id: &str,
    reason: &str,
    actor: &str,
    session: &str,
) -> Result<()> {
    let now = Utc::now();
    let now_str = format_datetime(&now);

    let affected = conn.execute(
        "UPDATE issues SET status = 'closed', closed_at = ?1, close_reason = ?2,
         closed_by_session = ?3, updated_at = ?1 WHERE id = ?4",
        params![now_str, reason, session, id],
    )?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id));
    }

    emit_event(
        conn,
        id,
        EventType::Closed,
        actor,
        None,
        Some(reason),
        None,
        &now_str,
    )?;

    Ok(())
}

/// Tombstones an issue on the given connection: records the pre-deletion
/// type, sets status/deleted_at/deleted_by/delete_reason, and clears the
/// issue's outgoing dependency edges (a tombstone has none).
pub(crate) fn delete_issue_on_conn(
    conn: &Connection,
    id: &str,
    deleted_by: &str,
    reason: &str,
) -> Result<()> {
    let current_type: String = conn
        .query_row("SELECT issue_type FROM issues WHERE id = ?1", params![id], |r| r.get(0))
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id),
            other => StorageError::Query(other),
        })?;

    let now = Utc::now();
    let now_str = format_datetime(&now);

    conn.execute(
        "UPDATE issues SET status = 'tombstone', deleted_at = ?1, deleted_by = ?2,
         delete_reason = ?3, original_type = ?4, updated_at = ?1 WHERE id = ?5",
        params![now_str, deleted_by, reason, current_type, id],
    )?;
    conn.execute("DELETE FROM dependencies WHERE from_id = ?1", params![id])?;

    emit_event(
        conn,
        id,
        EventType::Tombstoned,
        deleted_by,
        None,
        Some(reason),
        None,
        &now_str,
    )?;

    Ok(())
}

/// Searches issues on the given connection.
pub(crate) fn search_issues_on_conn(
    conn: &Connection,
    query: &str,
    filter: &IssueFilter,
) -> Result<Vec<Issue>> {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut param_idx = 1;

    // Full-text search across title, description, notes.
    if !query.is_empty() {
        where_clauses.push(format!(
            "(title LIKE ?{pi} OR description LIKE ?{pi} OR notes LIKE ?{pi})",
            pi = param_idx
        ));
        param_values.push(Box::new(format!("%{query}%")));
        param_idx += 1;
    }
    if let Some(ref text) = filter.text_search {
        where_clauses.push(format!(
            "(title LIKE ?{pi} OR description LIKE ?{pi} OR notes LIKE ?{pi})",
            pi = param_idx
        ));
        param_values.push(Box::new(format!("%{text}%")));
        param_idx += 1;
    }

    if let Some(ref status) = filter.status {
        where_clauses.push(format!("status = ?{param_idx}"));
        param_values.push(Box::new(status.as_str().to_string()));
        param_idx += 1;
    }
    if let Some(priority) = filter.priority {
        where_clauses.push(format!("priority = ?{param_idx}"));
        param_values.push(Box::new(priority));
        param_idx += 1;
    }
    if let Some(priority_min) = filter.priority_min {
        where_clauses.push(format!("priority >= ?{param_idx}"));
        param_values.push(Box::new(priority_min));
        param_idx += 1;
    }
    if let Some(priority_max) = filter.priority_max {
        where_clauses.push(format!("priority <= ?{param_idx}"));
        param_values.push(Box::new(priority_max));
        param_idx += 1;
    }
    if let Some(ref issue_type) = filter.issue_type {
        where_clauses.push(format!("issue_type = ?{param_idx}"));
        param_values.push(Box::new(issue_type.as_str().to_string()));
        param_idx += 1;
    }
    if let Some(ref created_after) = filter.created_after {
        where_clauses.push(format!("created_at >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(created_after)));
        param_idx += 1;
    }
    if let Some(ref created_before) = filter.created_before {
        where_clauses.push(format!("created_at <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(created_before)));
        param_idx += 1;
    }
    if let Some(ref updated_after) = filter.updated_after {
        where_clauses.push(format!("updated_at >= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(updated_after)));
        param_idx += 1;
    }
    if let Some(ref updated_before) = filter.updated_before {
        where_clauses.push(format!("updated_at <= ?{param_idx}"));
        param_values.push(Box::new(format_datetime(updated_before)));
        param_idx += 1;
    }
    if let Some(ref id_prefix) = filter.id_prefix {
        where_clauses.push(format!("id LIKE ?{param_idx}"));
        param_values.push(Box::new(format!("{id_prefix}%")));
        param_idx += 1;
    }

    // Exclude statuses (e.g. tombstones, unless explicitly requested).
    for status in &filter.exclude_status {
        where_clauses.push(format!("status != ?{param_idx}"));
        param_values.push(Box::new(status.as_str().to_string()));
        param_idx += 1;
    }

    // Labels AND.
    for label in &filter.labels {
        where_clauses.push(format!(
            "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = issues.id AND labels.label = ?{param_idx})"
        ));
        param_values.push(Box::new(label.clone()));
        param_idx += 1;
    }

    // Labels OR.
    if !filter.labels_any.is_empty() {
        let placeholders: Vec<String> = filter
            .labels_any
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", param_idx + i))
            .collect();
        where_clauses.push(format!(
            "EXISTS (SELECT 1 FROM labels WHERE labels.issue_id = issues.id AND labels.label IN ({}))",
            placeholders.join(",")
        ));
        for label in &filter.labels_any {
            param_values.push(Box::new(label.clone()));
        }
        param_idx += filter.labels_any.len();
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let limit_sql = filter
        .limit
        .map(|l| format!(" LIMIT {l}"))
        .unwrap_or_default();

    let sql = format!(
        "SELECT {ISSUE_COLUMNS} FROM issues {where_sql} ORDER BY created_at DESC{limit_sql}"
    );

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;

    let mut issues = Vec::new();
    for row in rows {
        issues.push(row?);
    }

    let _ = param_idx;

    Ok(issues)
}
