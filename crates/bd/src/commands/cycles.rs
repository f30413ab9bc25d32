//! `bd cycles` -- audit the dependency graph for cycles.

use anyhow::{Context, Result};

use beads_query::graph::{find_all_cycles, GraphSnapshot};
use beads_storage::SqliteStore;

use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::snapshot::load_all;

/// Execute the `bd cycles` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        anyhow::bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let (issues, dependencies) = load_all(&store)?;
    let snapshot = GraphSnapshot::new(&issues, &dependencies);
    let cycles = find_all_cycles(&snapshot);

    if ctx.json {
        output_json(&serde_json::json!({ "cycles": cycles }));
        return Ok(());
    }

    if cycles.is_empty() {
        println!("No dependency cycles found");
        return Ok(());
    }

    println!("Found {} dependency cycle(s):\n", cycles.len());
    for cycle in &cycles {
        println!("  {}", cycle.join(" -> "));
    }

    Ok(())
}
