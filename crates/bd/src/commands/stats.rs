//! `bd stats` -- show aggregate statistics about the issue database.

use anyhow::{bail, Context, Result};

use beads_storage::{SqliteStore, Storage};

use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `bd stats` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let stats = store
        .get_statistics()
        .context("failed to compute statistics")?;

    if ctx.json {
        output_json(&serde_json::json!({
            "total_issues": stats.total_issues,
            "open_issues": stats.open_issues,
            "closed_issues": stats.closed_issues,
            "in_progress_issues": stats.in_progress_issues,
            "blocked_issues": stats.blocked_issues,
            "tombstoned_issues": stats.tombstoned_issues,
            "by_type": stats.by_type,
            "by_priority": stats.by_priority,
        }));
        return Ok(());
    }

    println!("Project Statistics");
    println!("==================");
    println!();
    println!("Total issues: {}", stats.total_issues);
    println!("  Open:        {}", stats.open_issues);
    println!("  In Progress: {}", stats.in_progress_issues);
    println!("  Blocked:     {}", stats.blocked_issues);
    println!("  Closed:      {}", stats.closed_issues);
    println!("  Tombstoned:  {}", stats.tombstoned_issues);

    if !stats.by_type.is_empty() {
        println!();
        println!("By Type:");
        let headers = &["TYPE", "COUNT"];
        let rows: Vec<Vec<String>> = stats
            .by_type
            .iter()
            .map(|(t, c)| vec![t.clone(), c.to_string()])
            .collect();
        output_table(headers, &rows);
    }

    if !stats.by_priority.is_empty() {
        println!();
        println!("By Priority:");
        let headers = &["PRIORITY", "COUNT"];
        let rows: Vec<Vec<String>> = stats
            .by_priority
            .iter()
            .map(|(p, c)| vec![format!("P{}", p), c.to_string()])
            .collect();
        output_table(headers, &rows);
    }

    Ok(())
}
