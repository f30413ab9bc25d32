//! `bd dep` -- dependency management (add/remove/list).

use anyhow::{bail, Context, Result};

use beads_core::dependency::Dependency;
use beads_core::enums::DependencyType;
use beads_query::graph::GraphSnapshot;
use beads_storage::{SqliteStore, Storage};
use chrono::Utc;

use crate::cli::{DepArgs, DepCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::snapshot::load_all;

/// Execute the `bd dep` command.
pub fn run(ctx: &RuntimeContext, args: &DepArgs) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    match &args.command {
        DepCommands::Add(add_args) => {
            if ctx.readonly {
                bail!("cannot add dependencies in read-only mode");
            }

            let dep_type = DependencyType::from(add_args.dep_type.as_str());
            if !dep_type.is_valid() {
                bail!(
                    "invalid dependency type '{}' (valid: blocks, related, parent-child, discovered-from, ...)",
                    add_args.dep_type
                );
            }

            store
                .get_issue(&add_args.from)
                .with_context(|| format!("issue '{}' not found", add_args.from))?;
            store
                .get_issue(&add_args.to)
                .with_context(|| format!("issue '{}' not found", add_args.to))?;

            let (issues, dependencies) = load_all(&store)?;
            let snapshot = GraphSnapshot::new(&issues, &dependencies);
            if let Some(cycle) = snapshot.would_create_cycle(&add_args.from, &add_args.to, &dep_type) {
                bail!(
                    "adding {} -> {} would create a dependency cycle: {}",
                    add_args.from,
                    add_args.to,
                    cycle.join(" -> ")
                );
            }

            let dependency = Dependency {
                issue_id: add_args.from.clone(),
                depends_on_id: add_args.to.clone(),
                dep_type: dep_type.clone(),
                created_at: Utc::now(),
                created_by: ctx.actor.clone(),
            };

            store
                .add_dependency(&dependency, &ctx.actor)
                .with_context(|| {
                    format!(
                        "failed to add dependency {} -> {}",
                        add_args.from, add_args.to
                    )
                })?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "from": add_args.from,
                    "to": add_args.to,
                    "type": dep_type.as_str(),
                }));
            } else {
                println!(
                    "Added dependency: {} --[{}]--> {}",
                    add_args.from, dep_type, add_args.to
                );
            }
        }

        DepCommands::Remove(remove_args) => {
            if ctx.readonly {
                bail!("cannot remove dependencies in read-only mode");
            }

            let dep_type = DependencyType::from(remove_args.dep_type.as_str());
            let removed = store
                .remove_dependency(&remove_args.from, &remove_args.to, dep_type, &ctx.actor)
                .is_ok();

            if ctx.json {
                output_json(&serde_json::json!({
                    "from": remove_args.from,
                    "to": remove_args.to,
                    "removed": removed,
                }));
            } else if removed {
                println!("Removed dependency: {} -> {}", remove_args.from, remove_args.to);
            } else {
                eprintln!("No dependency found: {} -> {}", remove_args.from, remove_args.to);
            }
        }

        DepCommands::List(list_args) => {
            let deps = store
                .get_dependencies_with_metadata(&list_args.id)
                .with_context(|| format!("failed to load dependencies for {}", list_args.id))?;
            let dependents = store
                .get_dependents_with_metadata(&list_args.id)
                .with_context(|| format!("failed to load dependents for {}", list_args.id))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "issue_id": list_args.id,
                    "depends_on": deps.iter().map(|d| serde_json::json!({
                        "id": d.issue.id,
                        "type": d.dependency.dep_type.as_str(),
                        "title": d.issue.title,
                        "status": d.issue.status.as_str(),
                    })).collect::<Vec<_>>(),
                    "depended_on_by": dependents.iter().map(|d| serde_json::json!({
                        "id": d.issue.id,
                        "type": d.dependency.dep_type.as_str(),
                        "title": d.issue.title,
                        "status": d.issue.status.as_str(),
                    })).collect::<Vec<_>>(),
                }));
            } else if deps.is_empty() && dependents.is_empty() {
                println!("No dependencies for {}", list_args.id);
            } else {
                if !deps.is_empty() {
                    println!("Depends on:");
                    for d in &deps {
                        println!(
                            "  [{}] {} {} ({})",
                            d.dependency.dep_type, d.issue.id, d.issue.title, d.issue.status
                        );
                    }
                }
                if !dependents.is_empty() {
                    if !deps.is_empty() {
                        println!();
                    }
                    println!("Depended on by:");
                    for d in &dependents {
                        println!(
                            "  [{}] {} {} ({})",
                            d.dependency.dep_type, d.issue.id, d.issue.title, d.issue.status
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
