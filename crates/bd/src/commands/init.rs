//! `bd init` -- initialize a beads database in the current directory.

use std::env;

use anyhow::{bail, Context, Result};

use beads_config::{ensure_beads_dir, save_config, BeadsConfig};
use beads_storage::{SqliteStore, Storage};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;

/// Default gitignore content for the `.beads` directory.
const GITIGNORE_CONTENT: &str = r#"# Beads database files
*.db
*.db-journal
*.db-wal
*.db-shm

# Local state
issues.jsonl
"#;

/// Execute the `bd init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let beads_dir = cwd.join(".beads");
    let db_path = beads_dir.join("beads.db");

    if !args.force && db_path.exists() {
        bail!(
            "Found existing database in {}\n\n\
            This workspace is already initialized.\n\n\
            To use the existing database:\n  \
            Just run bd commands normally (e.g., bd list)\n\n\
            To completely reinitialize (data loss warning):\n  \
            rm -rf {} && bd init\n\n\
            Or use --force to re-initialize.",
            beads_dir.display(),
            beads_dir.display()
        );
    }

    let prefix = match &args.prefix {
        Some(p) => p.trim_end_matches('-').to_string(),
        None => {
            let dir_name = cwd
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "bd".to_string());
            dir_name.trim_end_matches('-').to_string()
        }
    };

    ensure_beads_dir(&beads_dir).context("failed to create .beads directory")?;

    let gitignore_path = beads_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, GITIGNORE_CONTENT).with_context(|| {
            format!("failed to create .gitignore: {}", gitignore_path.display())
        })?;
    }

    let mut config = BeadsConfig::default();
    config.issue_prefix = format!("{}-", prefix);
    save_config(&beads_dir, &config).context("failed to write .beads/config.yaml")?;

    // Opening the store creates the database file and runs schema migrations.
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to create database: {}", db_path.display()))?;
    if !ctx.actor.is_empty() {
        let _ = store.set_metadata("init_actor", &ctx.actor);
    }
    let _ = store.set_metadata("last_import_time", &chrono::Utc::now().to_rfc3339());
    drop(store);

    if !args.quiet {
        println!();
        println!("bd initialized successfully!");
        println!();
        println!("  Database: {}", db_path.display());
        println!("  Issue prefix: {}", prefix);
        println!(
            "  Issues will be named: {}-<hash> (e.g., {}-a3f2)",
            prefix, prefix
        );
        println!();
        println!("Run `bd create \"My first issue\"` to get started.");
        println!();
    }

    Ok(())
}
