//! Export/import pipeline between a [`Storage`] backend and an on-disk
//! JSONL log.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;

use chrono::Utc;
use sha2::{Digest, Sha256};

use beads_core::enums::OrphanMode;
use beads_core::filter::IssueFilter;
use beads_core::issue::{Issue, IssueBuilder};
use beads_core::jsonl::{read_jsonl, write_jsonl, JsonlError};
use beads_storage::{IssueUpdates, Storage};

use crate::error::{Result, SyncError};
use crate::merge::tombstone_vs_live;

/// Tracking-metadata key recording the digest of the log as of the last
/// successful import.
const LAST_IMPORT_HASH_KEY: &str = "sync.last_import_hash";

/// Options controlling an import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub orphan_mode: OrphanMode,
    /// Forces the import even if the target store is non-empty and the
    /// incoming batch is empty, and refreshes the staleness watermark even
    /// when no record actually changed.
    pub force: bool,
    /// Bypasses the staleness gate for this invocation only.
    pub allow_stale: bool,
    pub actor: String,
}

/// Options controlling an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub filter: IssueFilter,
    /// Allows writing an empty snapshot over a non-empty existing log.
    pub force: bool,
}

/// Summary of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub created: i64,
    pub updated: i64,
    pub unchanged: i64,
    pub tombstoned: i64,
    pub skipped_orphans: i64,
    pub warnings: Vec<String>,
}

/// Writes a snapshot of every issue in `storage` matching `options.filter`
/// to `path`, atomically.
///
/// The file is written to a temporary path in the same directory, flushed
/// and fsynced, then renamed into place and permissioned `0600`. Refuses to
/// overwrite a non-empty existing log with zero records unless
/// `options.force` is set.
pub fn export(storage: &dyn Storage, path: &Path, options: &ExportOptions) -> Result<usize> {
    let issues = storage.search_issues("", &options.filter)?;

    if issues.is_empty() && !options.force {
        if let Ok(meta) = fs::metadata(path) {
            if meta.len() > 0 {
                return Err(SyncError::EmptyStoreOverwrite);
            }
        }
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("beads-export")
    ));

    {
        let mut tmp = File::create(&tmp_path)?;
        write_jsonl(&mut tmp, &issues).map_err(jsonl_write_err)?;
        tmp.flush()?;
        tmp.sync_all()?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(issues.len())
}

fn jsonl_write_err(e: JsonlError) -> SyncError {
    match e {
        JsonlError::Io(io) => SyncError::Io(io),
        JsonlError::Json { line, source } => SyncError::ParseError { line, source },
    }
}

/// Computes a digest identifying the current contents of the log at `path`.
///
/// When `prefer_content_hash` is `false` (no prior watermark recorded yet)
/// the digest is a cheap `mtime:size` pair. Once a watermark exists, later
/// calls use a SHA-256 content hash so that a restored file with an
/// unchanged mtime is still detected correctly.
pub fn compute_digest(path: &Path, prefer_content_hash: bool) -> Result<String> {
    let metadata = fs::metadata(path)?;

    if !prefer_content_hash {
        let mtime = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        return Ok(format!("{}:{}", mtime, metadata.len()));
    }

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Returns `true` if the store's recorded watermark does not match the
/// current digest of the log at `path` (or no log exists at all, which is
/// never stale).
pub fn is_stale(storage: &dyn Storage, path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let prior = match storage.get_metadata(LAST_IMPORT_HASH_KEY) {
        Ok(hash) => hash,
        Err(_) => return Ok(false), // never imported before: nothing to be stale against
    };
    let digest = compute_digest(path, true)?;
    Ok(prior != digest)
}

/// Imports every record from the JSONL log at `path` into `storage`.
pub fn import(storage: &dyn Storage, path: &Path, options: &ImportOptions) -> Result<ImportReport> {
    if !options.allow_stale && is_stale(storage, path)? {
        return Err(SyncError::Stale);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut report = ImportReport::default();

    for record in read_jsonl(reader) {
        let incoming = record.map_err(|e| match e {
            JsonlError::Io(io) => SyncError::Io(io),
            JsonlError::Json { line, source } => SyncError::ParseError { line, source },
        })?;

        for dep in &incoming.dependencies {
            if storage.get_issue(&dep.depends_on_id).is_err() {
                match options.orphan_mode {
                    OrphanMode::Strict => {
                        return Err(SyncError::OrphanDependency {
                            from: dep.issue_id.clone(),
                            to: dep.depends_on_id.clone(),
                        });
                    }
                    OrphanMode::Skip => {
                        report.skipped_orphans += 1;
                        report
                            .warnings
                            .push(format!(
                                "skipped dependency {} -> {}: endpoint missing",
                                dep.issue_id, dep.depends_on_id
                            ));
                    }
                    OrphanMode::Resurrect => {
                        resurrect_endpoint(storage, &dep.depends_on_id, options)?;
                        report.tombstoned += 1;
                        report.warnings.push(format!(
                            "resurrected missing endpoint {} as tombstone",
                            dep.depends_on_id
                        ));
                    }
                    OrphanMode::Allow | OrphanMode::Custom(_) => {}
                }
            }
        }

        apply_record(storage, &incoming, options, &mut report)?;
    }

    let changed = report.created > 0 || report.updated > 0 || report.tombstoned > 0;
    if changed || options.force {
        let digest = compute_digest(path, true)?;
        storage.set_metadata(LAST_IMPORT_HASH_KEY, &digest)?;
    }
    Ok(report)
}

/// Reconstructs a missing dependency endpoint as a tombstone so the edge
/// referencing it can be retained. No prior record of `id` survives in the
/// log being imported (the importing batch is the only history this
/// pipeline has access to), so the reconstruction is minimal: an otherwise
/// empty issue carrying only the id, immediately tombstoned.
fn resurrect_endpoint(storage: &dyn Storage, id: &str, options: &ImportOptions) -> Result<()> {
    if storage.get_issue(id).is_ok() {
        return Ok(());
    }
    let now = Utc::now();
    let mut issue = IssueBuilder::new(id)
        .id(id)
        .created_by(options.actor.clone())
        .created_at(now)
        .updated_at(now)
        .build();
    issue.tombstone(options.actor.clone(), "resurrected missing dependency endpoint", now);
    storage.create_issue(&issue, &options.actor)?;
    Ok(())
}

fn apply_record(
    storage: &dyn Storage,
    incoming: &Issue,
    options: &ImportOptions,
    report: &mut ImportReport,
) -> Result<()> {
    match storage.get_issue(&incoming.id) {
        Err(_) => {
            storage.create_issue(incoming, &options.actor)?;
            if incoming.is_tombstone() {
                report.tombstoned += 1;
            } else {
                report.created += 1;
            }
            Ok(())
        }
        Ok(existing) => {
            if existing.is_tombstone() != incoming.is_tombstone() {
                let resolved = tombstone_vs_live(&existing, incoming);
                if resolved.is_tombstone() && !existing.is_tombstone() {
                    storage.delete_issue(
                        &incoming.id,
                        &resolved.deleted_by,
                        &resolved.delete_reason,
                    )?;
                    report.tombstoned += 1;
                } else if !resolved.is_tombstone() && existing.is_tombstone() {
                    // Expired tombstone loses to the live incoming record:
                    // apply it as a full update.
                    apply_update(storage, &existing, incoming, options)?;
                    report.updated += 1;
                } else {
                    report.unchanged += 1;
                }
                return Ok(());
            }

            if existing.is_tombstone() {
                // Both sides already agree the issue is gone; re-running
                // delete_issue would only bump deleted_at and restart its
                // TTL clock for no reason.
                report.unchanged += 1;
            } else if incoming.updated_at > existing.updated_at {
                apply_update(storage, &existing, incoming, options)?;
                report.updated += 1;
            } else {
                report.unchanged += 1;
            }
            Ok(())
        }
    }
}

/// Applies a field update for a live issue. Never called with a tombstoned
/// `incoming`: that transition goes through [`Storage::delete_issue`]
/// directly so `deleted_at` is stamped fresh exactly once.
fn apply_update(
    storage: &dyn Storage,
    existing: &Issue,
    incoming: &Issue,
    options: &ImportOptions,
) -> Result<()> {
    debug_assert!(!incoming.is_tombstone());

    let updates = IssueUpdates {
        title: Some(incoming.title.clone()),
        description: Some(incoming.description.clone()),
        design: Some(incoming.design.clone()),
        acceptance_criteria: Some(incoming.acceptance_criteria.clone()),
        notes: Some(incoming.notes.clone()),
        status: Some(incoming.status.clone()),
        priority: Some(incoming.priority),
        issue_type: Some(incoming.issue_type.clone()),
        spec_id: Some(incoming.spec_id.clone()),
        external_ref: Some(incoming.external_ref.clone()),
        close_reason: Some(incoming.close_reason.clone()),
        closed_by_session: Some(incoming.closed_by_session.clone()),
    };
    storage.update_issue(&incoming.id, &updates, &options.actor)?;

    reconcile_labels(storage, &incoming.id, &existing.labels, &incoming.labels, &options.actor)?;
    Ok(())
}

fn reconcile_labels(
    storage: &dyn Storage,
    issue_id: &str,
    before: &[String],
    after: &[String],
    actor: &str,
) -> Result<()> {
    for label in after {
        if !before.contains(label) {
            storage.add_label(issue_id, label, actor)?;
        }
    }
    for label in before {
        if !after.contains(label) {
            storage.remove_label(issue_id, label, actor)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::issue::IssueBuilder;
    use beads_storage::SqliteStore;
    use tempfile::TempDir;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn export_then_import_round_trips() {
        let src = test_store();
        src.create_issue(&IssueBuilder::new("First").id("bd-1").build(), "alice")
            .unwrap();
        src.create_issue(&IssueBuilder::new("Second").id("bd-2").build(), "alice")
            .unwrap();

        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");
        let count = export(&src, &log_path, &ExportOptions::default()).unwrap();
        assert_eq!(count, 2);

        let dst = test_store();
        let report = import(
            &dst,
            &log_path,
            &ImportOptions {
                orphan_mode: OrphanMode::Allow,
                force: false,
                allow_stale: true,
                actor: "bob".into(),
            },
        )
        .unwrap();
        assert_eq!(report.created, 2);
        assert!(dst.get_issue("bd-1").is_ok());
        assert!(dst.get_issue("bd-2").is_ok());
    }

    #[test]
    fn export_refuses_empty_overwrite_without_force() {
        let store = test_store();
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");
        fs::write(&log_path, "{\"id\":\"bd-1\"}\n").unwrap();

        let err = export(&store, &log_path, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::EmptyStoreOverwrite));
    }

    #[test]
    fn import_skips_orphan_dependency_in_skip_mode() {
        let store = test_store();
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");

        let mut issue = IssueBuilder::new("Needs parent").id("bd-2").build();
        issue.dependencies.push(beads_core::dependency::Dependency {
            issue_id: "bd-2".into(),
            depends_on_id: "bd-missing".into(),
            dep_type: beads_core::enums::DependencyType::Blocks,
            created_at: chrono::Utc::now(),
            created_by: String::new(),
        });
        let mut f = File::create(&log_path).unwrap();
        write_jsonl(&mut f, std::slice::from_ref(&issue)).unwrap();

        let report = import(
            &store,
            &log_path,
            &ImportOptions {
                orphan_mode: OrphanMode::Skip,
                force: false,
                allow_stale: true,
                actor: "bob".into(),
            },
        )
        .unwrap();
        assert_eq!(report.skipped_orphans, 1);
    }

    #[test]
    fn import_rejects_orphan_dependency_in_strict_mode() {
        let store = test_store();
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");

        let mut issue = IssueBuilder::new("Needs parent").id("bd-2").build();
        issue.dependencies.push(beads_core::dependency::Dependency {
            issue_id: "bd-2".into(),
            depends_on_id: "bd-missing".into(),
            dep_type: beads_core::enums::DependencyType::Blocks,
            created_at: chrono::Utc::now(),
            created_by: String::new(),
        });
        let mut f = File::create(&log_path).unwrap();
        write_jsonl(&mut f, std::slice::from_ref(&issue)).unwrap();

        let err = import(
            &store,
            &log_path,
            &ImportOptions {
                orphan_mode: OrphanMode::Strict,
                force: false,
                allow_stale: true,
                actor: "bob".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::OrphanDependency { .. }));
    }

    #[test]
    fn import_resurrects_orphan_dependency_endpoint_as_tombstone() {
        let store = test_store();
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");

        let mut issue = IssueBuilder::new("Needs parent").id("bd-2").build();
        issue.dependencies.push(beads_core::dependency::Dependency {
            issue_id: "bd-2".into(),
            depends_on_id: "bd-missing".into(),
            dep_type: beads_core::enums::DependencyType::Blocks,
            created_at: chrono::Utc::now(),
            created_by: String::new(),
        });
        let mut f = File::create(&log_path).unwrap();
        write_jsonl(&mut f, std::slice::from_ref(&issue)).unwrap();

        let report = import(
            &store,
            &log_path,
            &ImportOptions {
                orphan_mode: OrphanMode::Resurrect,
                force: false,
                allow_stale: true,
                actor: "bob".into(),
            },
        )
        .unwrap();
        assert_eq!(report.tombstoned, 1);
        let resurrected = store.get_issue("bd-missing").unwrap();
        assert!(resurrected.is_tombstone());
    }

    #[test]
    fn stale_store_rejects_import_without_allow_stale() {
        let store = test_store();
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");
        let issue = IssueBuilder::new("Tracked").id("bd-1").build();
        let mut f = File::create(&log_path).unwrap();
        write_jsonl(&mut f, std::slice::from_ref(&issue)).unwrap();

        store.set_metadata(LAST_IMPORT_HASH_KEY, "stale-digest").unwrap();

        let err = import(
            &store,
            &log_path,
            &ImportOptions {
                orphan_mode: OrphanMode::Allow,
                force: false,
                allow_stale: false,
                actor: "bob".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Stale));
    }

    #[test]
    fn newer_record_updates_existing_issue() {
        let store = test_store();
        store
            .create_issue(&IssueBuilder::new("Original").id("bd-1").build(), "alice")
            .unwrap();

        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("issues.jsonl");
        let mut incoming = store.get_issue("bd-1").unwrap();
        incoming.title = "Updated title".into();
        incoming.updated_at = incoming.updated_at + chrono::Duration::seconds(5);
        let mut f = File::create(&log_path).unwrap();
        write_jsonl(&mut f, std::slice::from_ref(&incoming)).unwrap();

        let report = import(
            &store,
            &log_path,
            &ImportOptions {
                orphan_mode: OrphanMode::Allow,
                force: false,
                allow_stale: true,
                actor: "bob".into(),
            },
        )
        .unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(store.get_issue("bd-1").unwrap().title, "Updated title");
    }
}
