//! `bd label` -- add or remove a label on an issue.

use anyhow::{bail, Context, Result};

use beads_storage::{SqliteStore, Storage};

use crate::cli::{LabelArgs, LabelCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd label` command.
pub fn run(ctx: &RuntimeContext, args: &LabelArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot modify labels in read-only mode");
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

    store
        .get_issue(&args.id)
        .with_context(|| format!("issue '{}' not found", args.id))?;

    match &args.command {
        LabelCommands::Add(add_args) => {
            store
                .add_label(&args.id, &add_args.label, &ctx.actor)
                .with_context(|| format!("failed to add label '{}' to {}", add_args.label, args.id))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "status": "added",
                    "issue_id": args.id,
                    "label": add_args.label,
                }));
            } else {
                println!("Added label '{}' to {}", add_args.label, args.id);
            }
        }

        LabelCommands::Remove(remove_args) => {
            store
                .remove_label(&args.id, &remove_args.label, &ctx.actor)
                .with_context(|| {
                    format!("failed to remove label '{}' from {}", remove_args.label, args.id)
                })?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "status": "removed",
                    "issue_id": args.id,
                    "label": remove_args.label,
                }));
            } else {
                println!("Removed label '{}' from {}", remove_args.label, args.id);
            }
        }
    }

    Ok(())
}
