//! Configuration types and loading for the beads system.
//!
//! The main entry point is [`BeadsConfig`], which represents the contents of
//! `.beads/config.yaml`. Configuration is loaded with [`load_config`] and
//! saved with [`save_config`]. The option set is closed: every value a
//! workspace can override is a named field here, not an open bag of keys.
//!
//! `figment` is intentionally not used here: layered env/CLI overrides are
//! out of scope for this crate, which only loads and saves the YAML file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use beads_core::enums::OrphanMode;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration file contained invalid YAML.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// The `.beads/` directory was not found.
    #[error("no .beads directory found (run 'bd init' first)")]
    BeadsDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Sync configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Branch the JSONL log is read from and exported to.
    #[serde(default = "default_sync_branch")]
    pub branch: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            branch: default_sync_branch(),
        }
    }
}

fn default_sync_branch() -> String {
    "main".to_string()
}

/// Import configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// How to handle dependency edges whose endpoint is missing locally.
    #[serde(default)]
    pub orphan_handling: OrphanMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            orphan_handling: OrphanMode::default(),
        }
    }
}

/// Tombstone retention configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TombstoneConfig {
    /// Days a tombstoned issue is retained before it is eligible for purge.
    #[serde(default = "default_tombstone_ttl_days")]
    pub ttl_days: u32,
}

impl Default for TombstoneConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_tombstone_ttl_days(),
        }
    }
}

fn default_tombstone_ttl_days() -> u32 {
    30
}

/// Readiness engine configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyConfig {
    /// Keywords in a blocking issue's close reason that count as a pass
    /// rather than a block, under `conditional-blocks` semantics.
    #[serde(default = "default_failure_keywords")]
    pub failure_keywords: HashSet<String>,
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            failure_keywords: default_failure_keywords(),
        }
    }
}

fn default_failure_keywords() -> HashSet<String> {
    ["failed", "blocked", "wontfix", "cancelled"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// File watcher configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Debounce window, in milliseconds, before a batch of file-change
    /// notifications is collapsed into a single import request.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Polling interval, in seconds, used when native file-system events
    /// are unavailable.
    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll_interval_s: default_poll_interval_s(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_poll_interval_s() -> u64 {
    5
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full beads configuration, corresponding to `.beads/config.yaml`.
///
/// This is a closed option set: every override a workspace can make is a
/// named field. All fields use `serde` defaults so that a partially
/// specified YAML file deserializes correctly with sensible defaults for
/// everything it omits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeadsConfig {
    /// Issue ID prefix (e.g., `"bd-"`).
    #[serde(default = "default_issue_prefix")]
    pub issue_prefix: String,

    /// Storage backend identifier. Only `"sqlite"` ships today; the field
    /// exists so a future backend can be selected without a config format
    /// change.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Import configuration.
    #[serde(default)]
    pub import: ImportConfig,

    /// Tombstone retention configuration.
    #[serde(default)]
    pub tombstone: TombstoneConfig,

    /// Readiness engine configuration.
    #[serde(default)]
    pub ready: ReadyConfig,

    /// File watcher configuration.
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Forces direct mode (no peer coordination, no watching, no
    /// auto-sync) regardless of auto-detection. `None` leaves
    /// auto-detection in effect.
    #[serde(default)]
    pub sandbox: Option<bool>,
}

impl Default for BeadsConfig {
    fn default() -> Self {
        Self {
            issue_prefix: default_issue_prefix(),
            backend: default_backend(),
            sync: SyncConfig::default(),
            import: ImportConfig::default(),
            tombstone: TombstoneConfig::default(),
            ready: ReadyConfig::default(),
            watcher: WatcherConfig::default(),
            sandbox: None,
        }
    }
}

fn default_issue_prefix() -> String {
    "bd-".to_string()
}

fn default_backend() -> String {
    "sqlite".to_string()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from `.beads/config.yaml` inside the given `.beads/` directory.
///
/// If the file does not exist, a default [`BeadsConfig`] is returned.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
/// or [`ConfigError::ParseError`] if it contains invalid YAML.
pub fn load_config(beads_dir: &Path) -> Result<BeadsConfig> {
    let config_path = beads_dir.join("config.yaml");

    if !config_path.exists() {
        return Ok(BeadsConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)?;

    // An empty file is valid and yields default config.
    if content.trim().is_empty() {
        return Ok(BeadsConfig::default());
    }

    let config: BeadsConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to `.beads/config.yaml` inside the given `.beads/` directory.
///
/// The directory is created if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] on I/O failure or [`ConfigError::ParseError`]
/// if serialization fails.
pub fn save_config(beads_dir: &Path, config: &BeadsConfig) -> Result<()> {
    std::fs::create_dir_all(beads_dir)?;

    let config_path = beads_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(config_path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
