//! `bd export` -- export the issue database to a JSONL log.

use std::path::Path;

use anyhow::{Context, Result};

use beads_storage::SqliteStore;
use beads_sync::pipeline::{export, ExportOptions};

use crate::cli::ExportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd export` command.
pub fn run(ctx: &RuntimeContext, args: &ExportArgs) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        anyhow::bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let options = ExportOptions {
        force: args.force,
        ..Default::default()
    };

    let count = export(&store, Path::new(&args.path), &options)
        .with_context(|| format!("failed to export to {}", args.path))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "path": args.path,
            "exported": count,
        }));
    } else {
        println!("Exported {} issue(s) to {}", count, args.path);
    }

    Ok(())
}
