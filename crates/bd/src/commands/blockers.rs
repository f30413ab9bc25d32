//! `bd blockers` -- list the open issues blocking a given issue.

use anyhow::{bail, Context, Result};

use beads_query::graph::GraphSnapshot;
use beads_storage::SqliteStore;

use crate::cli::BlockersArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::snapshot::load_all;

/// Execute the `bd blockers` command.
pub fn run(ctx: &RuntimeContext, args: &BlockersArgs) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let (issues, dependencies) = load_all(&store)?;
    let snapshot = GraphSnapshot::new(&issues, &dependencies);

    if snapshot.issue(&args.id).is_none() {
        bail!("issue '{}' not found", args.id);
    }

    let keywords: Vec<String> = ctx.config.ready.failure_keywords.iter().cloned().collect();
    let blockers = snapshot
        .blockers(&args.id, &keywords)
        .with_context(|| format!("failed to compute blockers for {}", args.id))?;

    if ctx.json {
        output_json(&blockers);
        return Ok(());
    }

    if blockers.is_empty() {
        println!("{} has no open blockers", args.id);
        return Ok(());
    }

    println!("{} is blocked by:", args.id);
    for issue in &blockers {
        println!("  [P{}] {}: {} ({})", issue.priority, issue.id, issue.title, issue.status);
    }

    Ok(())
}
