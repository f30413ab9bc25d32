//! `bd delete` -- tombstone issues.

use anyhow::{bail, Context, Result};

use beads_storage::{SqliteStore, Storage};

use crate::cli::DeleteArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd delete` command.
///
/// Deletion is a soft tombstone (see [`beads_storage::Storage::delete_issue`]):
/// the issue record is kept, marked deleted, and its outgoing dependency
/// edges are cleared. Tombstones are later reaped by `purge_tombstones`.
pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot delete issues in read-only mode");
    }

    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let reason = if args.reason.is_empty() {
        "deleted"
    } else {
        &args.reason
    };

    let mut deleted_ids: Vec<String> = Vec::new();

    for id in &args.ids {
        match store.delete_issue(id, &ctx.actor, reason) {
            Ok(()) => {
                deleted_ids.push(id.clone());
                if !ctx.json {
                    println!("Deleted {}", id);
                }
            }
            Err(e) => eprintln!("cannot delete {}: {:#}", id, e),
        }
    }

    if ctx.json {
        output_json(&deleted_ids);
    }

    Ok(())
}
