//! `bd merge` -- merge one issue into another, closing the source.

use anyhow::{bail, Context, Result};

use beads_storage::{IssueUpdates, SqliteStore, Storage};
use beads_sync::merge::{plan_merge, rewrite_references};

use crate::cli::MergeArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::snapshot::load_all;

/// Execute the `bd merge` command.
pub fn run(ctx: &RuntimeContext, args: &MergeArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot merge issues in read-only mode");
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

    let source = store
        .get_issue(&args.source)
        .with_context(|| format!("issue '{}' not found", args.source))?;
    let target = store
        .get_issue(&args.target)
        .with_context(|| format!("issue '{}' not found", args.target))?;

    let depends_on = store.get_dependencies_with_metadata(&source.id)?;
    let dependents = store.get_dependents_with_metadata(&source.id)?;
    let edges_touching_source: Vec<_> = depends_on
        .into_iter()
        .chain(dependents)
        .map(|m| m.dependency)
        .collect();

    let plan = plan_merge(&source, &target, &edges_touching_source)
        .with_context(|| format!("cannot merge {} into {}", args.source, args.target))?;

    for old_dep in &edges_touching_source {
        let _ = store.remove_dependency(
            &old_dep.issue_id,
            &old_dep.depends_on_id,
            old_dep.dep_type.clone(),
            &ctx.actor,
        );
    }
    for new_dep in &plan.redirected_dependencies {
        store.add_dependency(new_dep, &ctx.actor).with_context(|| {
            format!(
                "failed to redirect dependency {} -> {}",
                new_dep.issue_id, new_dep.depends_on_id
            )
        })?;
    }

    let (all_issues, _) = load_all(&store)?;
    for issue in &all_issues {
        if issue.id == plan.source_id || issue.id == plan.target_id {
            continue;
        }
        let mut updates = IssueUpdates::default();
        if let Some(new_desc) = rewrite_references(&issue.description, &plan.source_id, &plan.target_id) {
            updates.description = Some(new_desc);
        }
        if let Some(new_notes) = rewrite_references(&issue.notes, &plan.source_id, &plan.target_id) {
            updates.notes = Some(new_notes);
        }
        if !updates.is_empty() {
            store
                .update_issue(&issue.id, &updates, &ctx.actor)
                .with_context(|| format!("failed to rewrite references in {}", issue.id))?;
        }
    }

    store
        .close_issue(&plan.source_id, &plan.close_reason, &ctx.actor, "")
        .with_context(|| format!("failed to close {}", plan.source_id))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "source": plan.source_id,
            "target": plan.target_id,
            "redirected_dependencies": plan.redirected_dependencies.len(),
        }));
    } else {
        println!(
            "Merged {} into {} ({} dependency edge(s) redirected)",
            plan.source_id,
            plan.target_id,
            plan.redirected_dependencies.len()
        );
    }

    Ok(())
}
