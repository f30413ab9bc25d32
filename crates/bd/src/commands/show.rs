//! `bd show` -- display issue details.

use anyhow::{bail, Context, Result};

use beads_core::issue::Issue;
use beads_storage::{SqliteStore, Storage};

use crate::cli::ShowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_issue_detail, populate_labels, output_json};

/// Execute the `bd show` command.
pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let mut found: Vec<Issue> = Vec::new();
    let mut missing = 0;
    for id in &args.ids {
        match store.get_issue(id) {
            Ok(mut issue) => {
                populate_labels(&store, &mut issue);
                found.push(issue);
            }
            Err(_) => {
                eprintln!("Issue {} not found", id);
                missing += 1;
            }
        }
    }

    if ctx.json {
        if found.is_empty() {
            bail!("no issues found matching the provided IDs");
        }
        output_json(&found);
    } else {
        for (i, issue) in found.iter().enumerate() {
            if i > 0 {
                println!("\n{}\n", "-".repeat(60));
            }
            println!("{}", format_issue_detail(issue));
            println!();
        }
    }

    if found.is_empty() && missing > 0 && !ctx.json {
        std::process::exit(1);
    }

    Ok(())
}
