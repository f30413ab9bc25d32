//! `bd children` -- show the parent-child subtree rooted at an issue.

use anyhow::{bail, Context, Result};

use beads_storage::{SqliteStore, Storage};

use crate::cli::ChildrenArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd children` command.
pub fn run(ctx: &RuntimeContext, args: &ChildrenArgs) -> Result<()> {
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

    let nodes = store
        .get_dependency_tree(&args.id, args.max_depth, true)
        .with_context(|| format!("failed to load subtree for {}", args.id))?;

    if ctx.json {
        output_json(&nodes);
        return Ok(());
    }

    if nodes.len() <= 1 {
        println!("{} has no children", args.id);
        return Ok(());
    }

    println!("Children of {}:\n", args.id);
    for node in nodes.iter().skip(1) {
        let indent = "  ".repeat(node.depth as usize);
        println!(
            "{}[{}] {} {}: {} ({})",
            indent, node.dep_type, node.issue.id, node.issue.priority, node.issue.title, node.issue.status
        );
    }

    Ok(())
}
