//! `bd` -- dependency-aware issue tracker CLI.
//!
//! This is the entry point for the beads core surface. It parses CLI
//! arguments with clap, resolves the runtime context, and dispatches to
//! command handlers.

mod cli;
mod commands;
mod context;
mod id;
mod output;
mod snapshot;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // Install signal handlers for graceful shutdown.
    // First Ctrl+C: exit cleanly. Second: force exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            // Second signal: force exit
            std::process::exit(1);
        }
        // First signal: exit cleanly
        std::process::exit(0);
    });

    // Parse CLI arguments
    let cli = Cli::parse();

    let result = run(&cli);

    // Handle errors: print message and exit with code 1
    if let Err(e) = result {
        // For JSON mode, output error as JSON
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Build runtime context from global args
    let ctx = RuntimeContext::from_global_args(&cli.global)?;

    // Set up logging based on verbosity
    if ctx.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("bd=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match &cli.command {
        Some(Commands::Version) => commands::version::run(&ctx),
        Some(Commands::Init(args)) => commands::init::run(&ctx, args),
        Some(Commands::Create(args)) => commands::create::run(&ctx, args),
        Some(Commands::Show(args)) => commands::show::run(&ctx, args),
        Some(Commands::List(args)) => commands::list::run(&ctx, args),
        Some(Commands::Update(args)) => commands::update::run(&ctx, args),
        Some(Commands::Close(args)) => commands::close::run(&ctx, args),
        Some(Commands::Reopen(args)) => commands::reopen::run(&ctx, args),
        Some(Commands::Delete(args)) => commands::delete::run(&ctx, args),
        Some(Commands::Ready(args)) => commands::ready::run(&ctx, args),
        Some(Commands::Blockers(args)) => commands::blockers::run(&ctx, args),
        Some(Commands::Dep(args)) => commands::dep::run(&ctx, args),
        Some(Commands::Label(args)) => commands::label::run(&ctx, args),
        Some(Commands::Comment(args)) => commands::comment::run_add(&ctx, args),
        Some(Commands::Comments(args)) => commands::comment::run_list(&ctx, args),
        Some(Commands::History(args)) => commands::history::run(&ctx, args),
        Some(Commands::Children(args)) => commands::children::run(&ctx, args),
        Some(Commands::Cycles) => commands::cycles::run(&ctx),
        Some(Commands::Duplicates) => commands::duplicates::run(&ctx),
        Some(Commands::Merge(args)) => commands::merge::run(&ctx, args),
        Some(Commands::Export(args)) => commands::export::run(&ctx, args),
        Some(Commands::Import(args)) => commands::import::run(&ctx, args),
        Some(Commands::Stats) => commands::stats::run(&ctx),
        Some(Commands::Config(args)) => commands::config_cmd::run(&ctx, args),
        None => {
            // No subcommand -- print help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    }
}
