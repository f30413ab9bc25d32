//! `bd list` -- list issues with filtering and formatting.

use anyhow::{bail, Context, Result};

use beads_core::enums::{IssueType, Status};
use beads_core::filter::IssueFilter;
use beads_storage::{SqliteStore, Storage};

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{format_issue_row, output_json, output_table, populate_labels_bulk};

/// Execute the `bd list` command.
pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let mut filter = IssueFilter::default();

    if let Some(status) = &args.status {
        if status != "all" {
            filter.status = Some(Status::from(status.as_str()));
        }
    } else {
        filter.exclude_status = vec![Status::Closed, Status::Tombstone];
    }

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

    let query = args.search.as_deref().unwrap_or("");
    let mut issues = store
        .search_issues(query, &filter)
        .context("failed to search issues")?;

    populate_labels_bulk(&store, &mut issues);

    if ctx.json {
        output_json(&issues);
    } else {
        let headers = &["ID", "PRI", "TYPE", "STATUS", "TITLE", "LABELS"];
        let rows: Vec<Vec<String>> = issues.iter().map(format_issue_row).collect();
        output_table(headers, &rows);

        if let Some(limit) = args.limit {
            if issues.len() == limit as usize {
                eprintln!("\nShowing {} issues (pass --limit 0 for all)", limit);
            }
        }
    }

    Ok(())
}
