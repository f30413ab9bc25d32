//! DDL statements and migrations for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 format (SQLite has no native
//! datetime type). The `metadata` table is shared by two logically distinct
//! categories of key: workspace `configuration` (issue_prefix, backend,
//! sync branch, ...) and internal `tracking` state (schema version, applied
//! migrations); the `category` column keeps a config dump from leaking
//! tracking keys.

/// Current schema version. Bumped whenever DDL or migrations change.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Issues table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id                  TEXT PRIMARY KEY,
        content_hash        TEXT NOT NULL DEFAULT '',
        title               TEXT NOT NULL,
        description         TEXT NOT NULL DEFAULT '',
        design              TEXT NOT NULL DEFAULT '',
        acceptance_criteria TEXT NOT NULL DEFAULT '',
        notes               TEXT NOT NULL DEFAULT '',
        status              TEXT NOT NULL DEFAULT 'open',
        priority            INTEGER NOT NULL DEFAULT 2,
        issue_type          TEXT NOT NULL DEFAULT 'task',
        created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        created_by          TEXT NOT NULL DEFAULT '',
        updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        closed_at           TEXT,
        close_reason        TEXT NOT NULL DEFAULT '',
        closed_by_session   TEXT NOT NULL DEFAULT '',
        -- Tombstone fields
        deleted_at          TEXT,
        deleted_by          TEXT NOT NULL DEFAULT '',
        delete_reason       TEXT NOT NULL DEFAULT '',
        original_type       TEXT,
        -- Spec-drift metadata (opaque to storage)
        spec_id             TEXT NOT NULL DEFAULT '',
        spec_changed_at     TEXT,
        external_ref        TEXT
    )
    "#,
    // -- Indexes on issues ---------------------------------------------------
    "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status)",
    "CREATE INDEX IF NOT EXISTS idx_issues_priority ON issues(priority)",
    "CREATE INDEX IF NOT EXISTS idx_issues_issue_type ON issues(issue_type)",
    "CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_issues_updated_at ON issues(updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_issues_spec_id ON issues(spec_id)",
    "CREATE INDEX IF NOT EXISTS idx_issues_external_ref ON issues(external_ref)",
    // -- Dependencies table --------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS dependencies (
        from_id       TEXT NOT NULL,
        to_id         TEXT NOT NULL,
        type          TEXT NOT NULL DEFAULT 'blocks',
        created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        created_by    TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (from_id, to_id, type),
        FOREIGN KEY (from_id) REFERENCES issues(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_dependencies_from ON dependencies(from_id)",
    "CREATE INDEX IF NOT EXISTS idx_dependencies_to ON dependencies(to_id)",
    "CREATE INDEX IF NOT EXISTS idx_dependencies_to_type ON dependencies(to_id, type)",
    // -- Labels table --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS labels (
        issue_id TEXT NOT NULL,
        label    TEXT NOT NULL,
        PRIMARY KEY (issue_id, label),
        FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_labels_label ON labels(label)",
    // -- Comments table ------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        issue_id   TEXT NOT NULL,
        author     TEXT NOT NULL,
        text       TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_issue ON comments(issue_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_created_at ON comments(created_at)",
    // -- Events table (audit trail) ------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        issue_id    TEXT NOT NULL,
        event_type  TEXT NOT NULL,
        actor       TEXT NOT NULL,
        old_value   TEXT,
        new_value   TEXT,
        comment     TEXT,
        created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_issue ON events(issue_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at)",
    // -- Metadata table -------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key      TEXT PRIMARY KEY,
        value    TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'tracking'
    )
    "#,
];

/// Default configuration values inserted on first init, all under the
/// `configuration` metadata category.
///
/// Matches the closed configuration surface: issue id prefix, storage
/// backend, sync branch, import orphan-handling policy, tombstone
/// retention, the ready-work failure-keyword list, and watcher tuning.
pub const DEFAULT_CONFIG: &[(&str, &str)] = &[
    ("issue_prefix", "bd"),
    ("backend", "embedded"),
    ("sync.branch", "main"),
    ("import.orphan_handling", "allow"),
    ("tombstone.ttl_days", "30"),
    ("ready.failure_keywords", "failed,blocked,wontfix,cancelled"),
    ("watcher.debounce_ms", "500"),
    ("watcher.poll_interval_s", "5"),
    ("sandbox", "auto"),
];

/// Schema migrations applied after initial DDL.
///
/// Each migration is a `(name, sql)` pair. Migrations are tracked in the
/// `metadata` table under the key `migration:<name>` (category `tracking`)
/// so they run at most once.
pub const MIGRATIONS: &[(&str, &str)] = &[
    // Future migrations go here, e.g.:
    // ("001_add_foo_column", "ALTER TABLE issues ADD COLUMN foo TEXT DEFAULT ''"),
];
