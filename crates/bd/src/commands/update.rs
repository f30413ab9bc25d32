//! `bd update` -- update issue fields.

use anyhow::{bail, Context, Result};

use beads_core::enums::{IssueType, Status};
use beads_storage::{IssueUpdates, SqliteStore, Storage};

use crate::cli::UpdateArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, populate_labels};

/// Execute the `bd update` command.
pub fn run(ctx: &RuntimeContext, args: &UpdateArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot update issues in read-only mode");
    }

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

    let mut updates = IssueUpdates::default();
    let mut changes: Vec<String> = Vec::new();

    if let Some(title) = &args.title {
        changes.push(format!("title -> {}", title));
        updates.title = Some(title.clone());
    }
    if let Some(desc) = &args.description {
        changes.push("description updated".to_string());
        updates.description = Some(desc.clone());
    }
    if let Some(design) = &args.design {
        changes.push("design updated".to_string());
        updates.design = Some(design.clone());
    }
    if let Some(ac) = &args.acceptance_criteria {
        changes.push("acceptance criteria updated".to_string());
        updates.acceptance_criteria = Some(ac.clone());
    }
    if let Some(notes) = &args.notes {
        changes.push("notes updated".to_string());
        updates.notes = Some(notes.clone());
    }
    if let Some(t) = &args.issue_type {
        let normalized = IssueType::from(t.as_str()).normalize();
        changes.push(format!("type -> {}", normalized));
        updates.issue_type = Some(normalized);
    }
    if let Some(p) = &args.priority {
        let priority = parse_priority(p)?;
        changes.push(format!("priority -> P{}", priority));
        updates.priority = Some(priority);
    }
    if let Some(s) = &args.status {
        let status = Status::from(s.as_str());
        changes.push(format!("status -> {}", status));
        updates.status = Some(status);
    }

    if updates.is_empty() {
        bail!(
            "no fields to update. Specify at least one field flag (--title, --description, --design, --ac, --notes, --type, --priority, --status)"
        );
    }

    store
        .update_issue(&args.id, &updates, &ctx.actor)
        .with_context(|| format!("failed to update issue {}", args.id))?;

    if ctx.json {
        let mut issue = store.get_issue(&args.id)?;
        populate_labels(&store, &mut issue);
        output_json(&vec![issue]);
    } else if !ctx.quiet {
        println!("Updated {}", args.id);
        for change in &changes {
            println!("  {}", change);
        }
    }

    Ok(())
}

/// Parse a priority string.
fn parse_priority(s: &str) -> Result<i32> {
    let s = s.trim();
    let num_str = if s.starts_with('P') || s.starts_with('p') {
        &s[1..]
    } else {
        s
    };
    let p: i32 = num_str
        .parse()
        .with_context(|| format!("invalid priority '{}': expected 0-4 or P0-P4", s))?;
    if !(0..=4).contains(&p) {
        anyhow::bail!("priority must be between 0 and 4 (got {})", p);
    }
    Ok(p)
}
