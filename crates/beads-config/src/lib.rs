//! Configuration management for the beads system.
//!
//! This crate handles loading and saving `.beads/config.yaml` files,
//! discovering `.beads/` directories in the filesystem (including
//! `BEADS_DIR` overrides and `redirect` files), and providing typed access
//! to the closed set of beads configuration values.

pub mod beads_dir;
pub mod config;

pub use beads_dir::{ensure_beads_dir, find_beads_dir, find_beads_dir_or_error, write_redirect};
pub use config::{
    BeadsConfig, ConfigError, ImportConfig, ReadyConfig, Result, SyncConfig, TombstoneConfig,
    WatcherConfig, load_config, save_config,
};
