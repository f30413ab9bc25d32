//! `bd duplicates` -- find likely duplicate issues by content fingerprint.

use std::collections::HashMap;

use anyhow::{Context, Result};

use beads_storage::SqliteStore;
use beads_sync::merge::find_duplicates;

use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::snapshot::load_all;

/// Execute the `bd duplicates` command.
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

    let mut reference_counts: HashMap<String, usize> = HashMap::new();
    for dep in &dependencies {
        *reference_counts.entry(dep.issue_id.clone()).or_insert(0) += 1;
        *reference_counts.entry(dep.depends_on_id.clone()).or_insert(0) += 1;
    }

    let groups = find_duplicates(&issues, &reference_counts);

    if ctx.json {
        output_json(&serde_json::json!({
            "groups": groups.iter().map(|g| serde_json::json!({
                "target": g.target,
                "sources": g.sources,
            })).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    if groups.is_empty() {
        println!("No likely duplicates found");
        return Ok(());
    }

    println!("Found {} group(s) of likely duplicates:\n", groups.len());
    for group in &groups {
        println!("  keep {} <- merge {}", group.target, group.sources.join(", "));
    }
    println!("\nRun `bd merge <source> <target>` to merge a pair.");

    Ok(())
}
