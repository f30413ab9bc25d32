//! `bd reopen` -- reopen a closed issue.

use anyhow::{bail, Context, Result};

use beads_core::enums::Status;
use beads_storage::{IssueUpdates, SqliteStore, Storage};

use crate::cli::ReopenArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, populate_labels};

/// Execute the `bd reopen` command.
pub fn run(ctx: &RuntimeContext, args: &ReopenArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot reopen issues in read-only mode");
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

    let updates = IssueUpdates {
        status: Some(Status::Open),
        close_reason: Some(String::new()),
        ..Default::default()
    };

    store
        .update_issue(&args.id, &updates, &ctx.actor)
        .with_context(|| format!("failed to reopen issue {}", args.id))?;

    let mut issue = store.get_issue(&args.id)?;
    populate_labels(&store, &mut issue);

    if ctx.json {
        output_json(&vec![issue]);
    } else {
        println!("Reopened {}", args.id);
    }

    Ok(())
}
