//! Clap CLI definitions for the `bd` command.
//!
//! This module defines the CLI structure using clap 4 derive macros: one
//! subcommand per core operation, plus the handful of subcommand trees
//! (`dep`, `label`, `config`) that group related actions.

use clap::{Args, Parser, Subcommand};

/// bd -- dependency-aware issue tracker.
///
/// Issues chained together like beads. A lightweight issue tracker with
/// first-class dependency support.
#[derive(Parser, Debug)]
#[command(
    name = "bd",
    about = "Dependency-aware issue tracker",
    long_about = "Issues chained together like beads. A lightweight issue tracker with first-class dependency support.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database directory (default: auto-discover `.beads/`).
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Actor name for audit trail (default: $BD_ACTOR, git user.name, $USER).
    #[arg(long, global = true, env = "BD_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Force sandbox (direct) mode: skip peer coordination even if it
    /// would otherwise be available.
    #[arg(long, global = true)]
    pub sandbox: bool,

    /// Allow operations on potentially stale data (skip the staleness check
    /// on import).
    #[arg(long, global = true)]
    pub allow_stale: bool,

    /// Read-only mode: block write operations.
    #[arg(long, global = true)]
    pub readonly: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the bd version.
    Version,

    /// Initialize a new `.beads` directory in the current (or given) path.
    Init(InitArgs),

    /// Create a new issue.
    #[command(alias = "new")]
    Create(CreateArgs),

    /// Show one or more issues in detail.
    Show(ShowArgs),

    /// List issues, optionally filtered.
    List(ListArgs),

    /// Update fields on an existing issue.
    Update(UpdateArgs),

    /// Close one or more issues.
    Close(CloseArgs),

    /// Reopen a closed issue.
    Reopen(ReopenArgs),

    /// Soft-delete (tombstone) one or more issues.
    Delete(DeleteArgs),

    /// List issues that are ready to work on.
    Ready(ReadyArgs),

    /// List the unresolved blockers of an issue.
    Blockers(BlockersArgs),

    /// Manage dependency edges between issues.
    Dep(DepArgs),

    /// Manage labels on an issue.
    Label(LabelArgs),

    /// Add a comment to an issue.
    Comment(CommentArgs),

    /// List comments on an issue.
    Comments(CommentsArgs),

    /// Show the audit history of an issue.
    History(HistoryArgs),

    /// Show the parent-child subtree rooted at an issue.
    Children(ChildrenArgs),

    /// Audit the dependency graph for cycles.
    Cycles,

    /// Find likely duplicate issues by content fingerprint.
    Duplicates,

    /// Merge one issue into another.
    Merge(MergeArgs),

    /// Export the issue database to a JSONL log.
    Export(ExportArgs),

    /// Import issues from a JSONL log.
    Import(ImportArgs),

    /// Show aggregate statistics about the issue database.
    Stats,

    /// Get or set a workspace configuration value.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `bd init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Issue ID prefix (default: current directory name).
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// Suppress output.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Re-initialize even if a `.beads` directory already exists here.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Arguments for `bd create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title.
    pub title: String,

    /// Issue description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Design notes.
    #[arg(long)]
    pub design: Option<String>,

    /// Acceptance criteria.
    #[arg(long = "ac")]
    pub acceptance_criteria: Option<String>,

    /// Issue type (task|bug|feature|epic|chore|discovered).
    #[arg(short = 't', long = "type", default_value = "task")]
    pub issue_type: String,

    /// Priority (0-4 or P0-P4).
    #[arg(short = 'p', long, default_value = "2")]
    pub priority: String,

    /// Labels to attach (repeatable).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// External reference (e.g. a tracker URL or id).
    #[arg(long)]
    pub external_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

/// Arguments for `bd show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue IDs to display.
    #[arg(required = true)]
    pub ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Arguments for `bd list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (open, in_progress, blocked, closed, tombstone).
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by labels (AND: must have ALL).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Free-text search across title/description/notes.
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum issues to show.
    #[arg(short = 'n', long)]
    pub limit: Option<i32>,
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Arguments for `bd update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue ID to update.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// New design notes.
    #[arg(long)]
    pub design: Option<String>,

    /// New acceptance criteria.
    #[arg(long = "ac")]
    pub acceptance_criteria: Option<String>,

    /// New notes.
    #[arg(long)]
    pub notes: Option<String>,

    /// New issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// New priority (0-4 or P0-P4).
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// New status.
    #[arg(short = 's', long)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Close / Reopen / Delete
// ---------------------------------------------------------------------------

/// Arguments for `bd close`.
#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Issue IDs to close.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Reason for closing.
    #[arg(short = 'r', long, default_value = "")]
    pub reason: String,
}

/// Arguments for `bd reopen`.
#[derive(Args, Debug)]
pub struct ReopenArgs {
    /// Issue ID to reopen.
    pub id: String,
}

/// Arguments for `bd delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue IDs to delete.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Reason for deletion.
    #[arg(short = 'r', long, default_value = "")]
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Ready / Blockers
// ---------------------------------------------------------------------------

/// Arguments for `bd ready`.
#[derive(Args, Debug)]
pub struct ReadyArgs {
    /// Maximum issues to show.
    #[arg(short = 'n', long)]
    pub limit: Option<i32>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by labels (AND: must have ALL).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,
}

/// Arguments for `bd blockers`.
#[derive(Args, Debug)]
pub struct BlockersArgs {
    /// Issue ID to list unresolved blockers for.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Dep
// ---------------------------------------------------------------------------

/// Arguments for `bd dep`.
#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

/// Dependency subcommands.
#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Add a dependency between issues.
    Add(DepAddArgs),
    /// Remove a dependency between issues.
    Remove(DepRemoveArgs),
    /// List dependencies and dependents of an issue.
    List(DepListArgs),
}

/// Arguments for `bd dep add`.
#[derive(Args, Debug)]
pub struct DepAddArgs {
    /// Issue that depends on `to`.
    pub from: String,
    /// Issue that `from` depends on.
    pub to: String,
    /// Dependency kind (blocks, parent-child, conditional-blocks,
    /// waits-for, related, discovered-from, replies-to, duplicates,
    /// supersedes).
    #[arg(short = 't', long = "type", default_value = "blocks")]
    pub dep_type: String,
}

/// Arguments for `bd dep remove`.
#[derive(Args, Debug)]
pub struct DepRemoveArgs {
    /// Issue that depends on `to`.
    pub from: String,
    /// Issue that `from` depends on.
    pub to: String,
    /// Dependency kind to remove.
    #[arg(short = 't', long = "type", default_value = "blocks")]
    pub dep_type: String,
}

/// Arguments for `bd dep list`.
#[derive(Args, Debug)]
pub struct DepListArgs {
    /// Issue ID.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// Arguments for `bd label`.
#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Issue ID.
    pub id: String,
    #[command(subcommand)]
    pub command: LabelCommands,
}

/// Label subcommands.
#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Add a label to an issue.
    Add(LabelAddArgs),
    /// Remove a label from an issue.
    Remove(LabelRemoveArgs),
}

/// Arguments for `bd label <id> add`.
#[derive(Args, Debug)]
pub struct LabelAddArgs {
    /// Label to add.
    pub label: String,
}

/// Arguments for `bd label <id> remove`.
#[derive(Args, Debug)]
pub struct LabelRemoveArgs {
    /// Label to remove.
    pub label: String,
}

// ---------------------------------------------------------------------------
// Comment / History / Children
// ---------------------------------------------------------------------------

/// Arguments for `bd comment`.
#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Issue ID.
    pub id: String,
    /// Comment text.
    pub text: String,
}

/// Arguments for `bd comments`.
#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Issue ID.
    pub id: String,
}

/// Arguments for `bd history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Issue ID to show history for.
    pub id: String,

    /// Maximum events to show.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: i32,
}

/// Arguments for `bd children`.
#[derive(Args, Debug)]
pub struct ChildrenArgs {
    /// Issue ID to find the parent-child subtree of.
    pub id: String,

    /// Maximum traversal depth.
    #[arg(long, default_value = "10")]
    pub max_depth: i32,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Arguments for `bd merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Issue to merge (will be closed).
    pub source: String,
    /// Issue to merge into (survives).
    pub target: String,
}

// ---------------------------------------------------------------------------
// Export / Import
// ---------------------------------------------------------------------------

/// Arguments for `bd export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Path to the JSONL file to write.
    pub path: String,

    /// Overwrite a non-empty log with an empty snapshot.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `bd import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the JSONL file to read.
    pub path: String,

    /// Policy for dependency edges whose endpoint is missing locally
    /// (overrides `import.orphan_handling` from config for this run).
    #[arg(long)]
    pub orphan_handling: Option<String>,

    /// Force the import even when the incoming batch is empty.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `bd config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value.
    Set(ConfigSetArgs),
    /// Get a configuration value.
    Get(ConfigGetArgs),
}

/// Arguments for `bd config set`.
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Configuration key (e.g. `issue_prefix`, `tombstone.ttl_days`).
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Arguments for `bd config get`.
#[derive(Args, Debug)]
pub struct ConfigGetArgs {
    /// Configuration key.
    pub key: String,
}
