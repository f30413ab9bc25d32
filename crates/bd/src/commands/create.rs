//! `bd create` -- create a new issue.

use anyhow::{bail, Context, Result};
use chrono::Utc;

use beads_core::enums::IssueType;
use beads_core::issue::IssueBuilder;
use beads_storage::{SqliteStore, Storage};

use crate::cli::CreateArgs;
use crate::context::RuntimeContext;
use crate::id;
use crate::output::output_json;

/// Execute the `bd create` command.
pub fn run(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot create issues in read-only mode");
    }

    let priority = parse_priority(&args.priority)?;
    let issue_type = IssueType::from(args.issue_type.as_str()).normalize();
    let description = args.description.clone().unwrap_or_default();

    let db_path = ctx.db_file()?;
    if !db_path.exists() {
        bail!(
            "no beads database found at {}\nHint: run 'bd init' to create a database",
            db_path.display()
        );
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let id = id::allocate(
        &store,
        &ctx.config.issue_prefix,
        &args.title,
        &description,
        &ctx.actor,
    )?;

    let now = Utc::now();
    let labels: Vec<String> = args
        .labels
        .iter()
        .flat_map(|l| l.split(',').map(|s| s.trim().to_string()))
        .filter(|l| !l.is_empty())
        .collect();

    let mut builder = IssueBuilder::new(&args.title)
        .id(id.clone())
        .description(description.clone())
        .design(args.design.clone().unwrap_or_default())
        .acceptance_criteria(args.acceptance_criteria.clone().unwrap_or_default())
        .issue_type(issue_type)
        .priority(priority)
        .created_by(ctx.actor.clone())
        .created_at(now)
        .updated_at(now)
        .labels(labels);
    if let Some(ext) = &args.external_ref {
        builder = builder.external_ref(ext.clone());
    }
    let issue = builder.build();

    store
        .create_issue(&issue, &ctx.actor)
        .with_context(|| format!("failed to create issue {}", id))?;

    if ctx.json {
        output_json(&issue);
    } else {
        println!("Created issue: {}", id);
        println!("  Title: {}", args.title);
        println!("  Priority: P{}", priority);
        println!("  Status: open");
    }

    Ok(())
}

/// Parse a priority string that can be either a bare number ("2") or prefixed ("P2"/"p2").
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
        bail!("priority must be between 0 and 4 (got {})", p);
    }

    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_priority_bare_number() {
        assert_eq!(parse_priority("0").unwrap(), 0);
        assert_eq!(parse_priority("2").unwrap(), 2);
        assert_eq!(parse_priority("4").unwrap(), 4);
    }

    #[test]
    fn parse_priority_prefixed() {
        assert_eq!(parse_priority("P0").unwrap(), 0);
        assert_eq!(parse_priority("P3").unwrap(), 3);
        assert_eq!(parse_priority("p1").unwrap(), 1);
    }

    #[test]
    fn parse_priority_out_of_range() {
        assert!(parse_priority("5").is_err());
        assert!(parse_priority("-1").is_err());
        assert!(parse_priority("P5").is_err());
    }

    #[test]
    fn parse_priority_invalid() {
        assert!(parse_priority("high").is_err());
        assert!(parse_priority("").is_err());
    }
}
