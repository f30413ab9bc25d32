//! `bd config` -- get or set a workspace configuration value.

use anyhow::{bail, Context, Result};

use beads_config::{load_config, save_config};
use beads_core::enums::OrphanMode;

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd config` command.
pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    let beads_dir = ctx
        .resolve_db_path()
        .context("no beads database found. Run 'bd init' to create one.")?;

    match &args.command {
        ConfigCommands::Set(set_args) => {
            if ctx.readonly {
                bail!("cannot set config in read-only mode");
            }

            let mut config = load_config(&beads_dir).context("failed to load config")?;
            set_field(&mut config, &set_args.key, &set_args.value)?;
            save_config(&beads_dir, &config).context("failed to save config")?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "key": set_args.key,
                    "value": set_args.value,
                }));
            } else if !ctx.quiet {
                println!("Set {} = {}", set_args.key, set_args.value);
            }
        }

        ConfigCommands::Get(get_args) => {
            let config = load_config(&beads_dir).context("failed to load config")?;
            let value = get_field(&config, &get_args.key)?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "key": get_args.key,
                    "value": value,
                }));
            } else {
                match value {
                    Some(v) => println!("{}", v),
                    None => {
                        eprintln!("Key '{}' not found", get_args.key);
                        std::process::exit(1);
                    }
                }
            }
        }
    }

    Ok(())
}

fn get_field(config: &beads_config::BeadsConfig, key: &str) -> Result<Option<String>> {
    Ok(match key {
        "issue_prefix" => Some(config.issue_prefix.clone()),
        "backend" => Some(config.backend.clone()),
        "sync.branch" => Some(config.sync.branch.clone()),
        "import.orphan_handling" => Some(config.import.orphan_handling.as_str().to_string()),
        "tombstone.ttl_days" => Some(config.tombstone.ttl_days.to_string()),
        "watcher.debounce_ms" => Some(config.watcher.debounce_ms.to_string()),
        "watcher.poll_interval_s" => Some(config.watcher.poll_interval_s.to_string()),
        "sandbox" => config.sandbox.map(|b| b.to_string()),
        "ready.failure_keywords" => {
            let mut keywords: Vec<&String> = config.ready.failure_keywords.iter().collect();
            keywords.sort();
            Some(
                keywords
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(","),
            )
        }
        _ => bail!("unknown configuration key '{}'", key),
    })
}

fn set_field(config: &mut beads_config::BeadsConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "issue_prefix" => config.issue_prefix = value.trim_end_matches('-').to_string() + "-",
        "backend" => config.backend = value.to_string(),
        "sync.branch" => config.sync.branch = value.to_string(),
        "import.orphan_handling" => config.import.orphan_handling = OrphanMode::from(value),
        "tombstone.ttl_days" => {
            config.tombstone.ttl_days = value
                .parse()
                .with_context(|| format!("'{}' is not a valid number of days", value))?
        }
        "watcher.debounce_ms" => {
            config.watcher.debounce_ms = value
                .parse()
                .with_context(|| format!("'{}' is not a valid number of milliseconds", value))?
        }
        "watcher.poll_interval_s" => {
            config.watcher.poll_interval_s = value
                .parse()
                .with_context(|| format!("'{}' is not a valid number of seconds", value))?
        }
        "sandbox" => {
            config.sandbox = Some(
                value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid boolean", value))?,
            )
        }
        "ready.failure_keywords" => {
            config.ready.failure_keywords =
                value.split(',').map(|s| s.trim().to_string()).collect()
        }
        _ => bail!("unknown configuration key '{}'", key),
    }
    Ok(())
}
