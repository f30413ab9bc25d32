//! `bd import` -- import issues from a JSONL log.

use std::path::Path;

use anyhow::{Context, Result};

use beads_core::enums::OrphanMode;
use beads_storage::SqliteStore;
use beads_sync::pipeline::{import, ImportOptions};

use crate::cli::ImportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd import` command.
pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
    if ctx.readonly {
        anyhow::bail!("cannot import in read-only mode");
    }

    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        anyhow::bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let orphan_mode = match &args.orphan_handling {
        Some(mode) => OrphanMode::from(mode.as_str()),
        None => ctx.config.import.orphan_handling.clone(),
    };

    let options = ImportOptions {
        orphan_mode,
        force: args.force,
        allow_stale: args.force,
        actor: ctx.actor.clone(),
    };

    let report = import(&store, Path::new(&args.path), &options)
        .with_context(|| format!("failed to import from {}", args.path))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "created": report.created,
            "updated": report.updated,
            "unchanged": report.unchanged,
            "tombstoned": report.tombstoned,
            "skipped_orphans": report.skipped_orphans,
            "warnings": report.warnings,
        }));
        return Ok(());
    }

    println!(
        "Imported {}: {} created, {} updated, {} unchanged, {} tombstoned, {} orphan(s) skipped",
        args.path,
        report.created,
        report.updated,
        report.unchanged,
        report.tombstoned,
        report.skipped_orphans
    );
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    Ok(())
}
