//! `bd comment` and `bd comments` -- add and list comments on issues.

use anyhow::{bail, Context, Result};

use beads_storage::{SqliteStore, Storage};

use crate::cli::{CommentArgs, CommentsArgs};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd comment` command (add a comment).
pub fn run_add(ctx: &RuntimeContext, args: &CommentArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot add comments in read-only mode");
    }

    if args.text.trim().is_empty() {
        bail!("comment text cannot be empty");
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

    let comment = store
        .add_comment(&args.id, &ctx.actor, &args.text)
        .with_context(|| format!("failed to add comment to {}", args.id))?;

    if ctx.json {
        output_json(&comment);
    } else {
        println!("Added comment to {}", args.id);
    }

    Ok(())
}

/// Execute the `bd comments` command (list comments).
pub fn run_list(ctx: &RuntimeContext, args: &CommentsArgs) -> Result<()> {
    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let comments = store
        .get_comments(&args.id)
        .with_context(|| format!("failed to load comments for {}", args.id))?;

    if ctx.json {
        output_json(&comments);
    } else if comments.is_empty() {
        println!("No comments on {}", args.id);
    } else {
        println!("Comments on {}:\n", args.id);
        for comment in &comments {
            let time_display = comment.created_at.format("%Y-%m-%d %H:%M").to_string();
            println!("  {} {}", time_display, comment.author);
            for line in comment.text.lines() {
                println!("    {}", line);
            }
            println!();
        }
    }

    Ok(())
}
