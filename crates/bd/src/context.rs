//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds all the state a command handler needs:
//! resolved `.beads` directory, actor name, global flags, and loaded
//! configuration.

use std::env;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};

use beads_config::{BeadsConfig, find_beads_dir, load_config};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Resolved `.beads` directory path (e.g., `/repo/.beads`).
    pub beads_dir: Option<PathBuf>,

    /// Actor name for audit trail.
    pub actor: String,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Sandbox mode: disables auto-sync and peer coordination. Resolved
    /// from `--sandbox`, falling back to `config.sandbox`, falling back to
    /// auto-detection via [`beads_lockfile::detect_sandbox`].
    pub sandbox: bool,

    /// Allow operations on potentially stale data.
    pub allow_stale: bool,

    /// Read-only mode: block write operations.
    pub readonly: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,

    /// Loaded `.beads/config.yaml`, or defaults if no `.beads` directory
    /// was found.
    pub config: BeadsConfig,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Resolves the actor name using the priority chain documented on
    /// [`resolve_actor`], and the `.beads` directory via
    /// [`beads_config::find_beads_dir`] (which itself honors `BEADS_DIR`,
    /// `redirect` files, and nearest-wins shadowing).
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let actor = resolve_actor(global.actor.as_deref());

        let beads_dir = match &global.db {
            Some(db) => Some(PathBuf::from(db)),
            None => {
                let cwd = env::current_dir().context("failed to read current directory")?;
                find_beads_dir(&cwd)
            }
        };

        let config = match &beads_dir {
            Some(dir) => load_config(dir).context("failed to load .beads/config.yaml")?,
            None => BeadsConfig::default(),
        };

        let sandbox = global.sandbox
            || config.sandbox.unwrap_or_else(|| {
                beads_dir
                    .as_deref()
                    .map(beads_lockfile::detect_sandbox)
                    .unwrap_or(false)
            });

        Ok(Self {
            beads_dir,
            actor,
            json: global.json,
            sandbox,
            allow_stale: global.allow_stale,
            readonly: global.readonly,
            verbose: global.verbose,
            quiet: global.quiet,
            config,
        })
    }

    /// Returns the resolved `.beads` directory, if one was found.
    pub fn resolve_db_path(&self) -> Option<PathBuf> {
        self.beads_dir.clone()
    }

    /// Returns the path to the SQLite database file inside the `.beads`
    /// directory, or an error describing the missing directory.
    pub fn db_file(&self) -> Result<PathBuf> {
        self.beads_dir
            .clone()
            .map(|dir| dir.join("beads.db"))
            .context("no .beads directory found (run 'bd init' first)")
    }
}

/// Resolves the actor name using the priority chain.
///
/// Priority: explicit flag > BD_ACTOR env > BEADS_ACTOR env > git config user.name > USER env > "unknown".
pub fn resolve_actor(flag_value: Option<&str>) -> String {
    // 1. Explicit flag value
    if let Some(actor) = flag_value {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    // 2. BD_ACTOR env
    if let Ok(actor) = env::var("BD_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    // 3. BEADS_ACTOR env
    if let Ok(actor) = env::var("BEADS_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    // 4. git config user.name
    if let Ok(output) = Command::new("git").args(["config", "user.name"]).output() {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    // 5. USER env (Unix) or USERNAME env (Windows)
    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        if !user.is_empty() {
            return user;
        }
    }

    // 6. Fallback
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_actor_with_flag() {
        assert_eq!(resolve_actor(Some("alice")), "alice");
    }

    #[test]
    fn resolve_actor_empty_flag_falls_through() {
        // With empty flag, it should fall through to env/git/default
        let result = resolve_actor(Some(""));
        assert!(!result.is_empty());
    }

    #[test]
    fn resolve_actor_none_falls_through() {
        let result = resolve_actor(None);
        // Should at least return something (git user, env, or "unknown")
        assert!(!result.is_empty());
    }
}
