//! `bd history` -- show event history for an issue.

use anyhow::{bail, Context, Result};

use beads_storage::{SqliteStore, Storage};

use crate::cli::HistoryArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd history` command.
pub fn run(ctx: &RuntimeContext, args: &HistoryArgs) -> Result<()> {
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

    let events = store
        .get_events(&args.id, args.limit)
        .with_context(|| format!("failed to load history for {}", args.id))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "issue_id": args.id,
            "events": events,
        }));
        return Ok(());
    }

    if events.is_empty() {
        println!("No history for {}", args.id);
        return Ok(());
    }

    println!("History for {}:\n", args.id);
    for event in &events {
        let timestamp = event.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let actor_str = if event.actor.is_empty() {
            String::new()
        } else {
            format!(" by {}", event.actor)
        };

        let detail = match (&event.old_value, &event.new_value) {
            (Some(old), Some(new)) => format!("{} -> {}", old, new),
            (None, Some(new)) => new.clone(),
            (Some(old), None) => old.clone(),
            (None, None) => event.comment.clone().unwrap_or_default(),
        };

        if detail.is_empty() {
            println!("  {} {}{}", timestamp, event.event_type, actor_str);
        } else {
            println!("  {} {}{}: {}", timestamp, event.event_type, actor_str, detail);
        }
    }

    Ok(())
}
