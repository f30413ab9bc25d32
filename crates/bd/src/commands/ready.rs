//! `bd ready` -- show ready work items (open, no active blockers).

use anyhow::{bail, Context, Result};

use beads_core::enums::IssueType;
use beads_core::filter::ReadyFilter;
use beads_query::graph::GraphSnapshot;
use beads_storage::SqliteStore;

use crate::cli::ReadyArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::snapshot::load_all;

/// Execute the `bd ready` command.
pub fn run(ctx: &RuntimeContext, args: &ReadyArgs) -> Result<()> {
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

    let mut filter = ReadyFilter::default();
    if let Some(t) = &args.issue_type {
        filter.issue_type = Some(IssueType::from(t.as_str()).normalize());
    }
    filter.labels = args
        .labels
        .iter()
        .flat_map(|l| l.split(','))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    filter.limit = args.limit;

    let keywords: Vec<String> = ctx.config.ready.failure_keywords.iter().cloned().collect();
    let ready = snapshot
        .ready_work(&filter, &keywords)
        .context("failed to compute ready work")?;

    if ctx.json {
        output_json(&ready);
        return Ok(());
    }

    if ready.is_empty() {
        println!("\nNo ready work found\n");
        return Ok(());
    }

    println!(
        "\nReady work ({} issues with no active blockers):\n",
        ready.len()
    );
    for (i, issue) in ready.iter().enumerate() {
        println!(
            "{}. [P{}] [{}] {}: {}",
            i + 1,
            issue.priority,
            issue.issue_type,
            issue.id,
            issue.title
        );
    }
    println!();

    Ok(())
}
