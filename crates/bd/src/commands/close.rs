//! `bd close` -- close one or more issues.

use anyhow::{bail, Context, Result};

use beads_core::issue::Issue;
use beads_storage::{SqliteStore, Storage};

use crate::cli::CloseArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, populate_labels};

/// Execute the `bd close` command.
pub fn run(ctx: &RuntimeContext, args: &CloseArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot close issues in read-only mode");
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
        "Closed"
    } else {
        &args.reason
    };

    let mut closed: Vec<Issue> = Vec::new();

    for id in &args.ids {
        match store.close_issue(id, reason, &ctx.actor, "") {
            Ok(()) => {
                if !ctx.json {
                    println!("Closed {}: {}", id, reason);
                }
                if let Ok(mut issue) = store.get_issue(id) {
                    populate_labels(&store, &mut issue);
                    closed.push(issue);
                }
            }
            Err(e) => eprintln!("cannot close {}: {:#}", id, e),
        }
    }

    if ctx.json {
        output_json(&closed);
    }

    Ok(())
}
