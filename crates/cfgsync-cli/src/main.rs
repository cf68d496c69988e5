//! config-sync CLI
//!
//! The command-line interface for reconciling extension-provided
//! configuration with a site's active configuration.

mod cli;
mod commands;
mod context;
mod error;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    } else {
        cfgsync_core::logging::init();
    }

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Some(cmd) => execute_command(&root, cmd),
        None => {
            println!(
                "{} Configuration reconciliation for extension-provided configuration",
                "config-sync".green().bold()
            );
            println!();
            println!("Run {} for available commands.", "config-sync --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(root: &Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Status { all, json } => commands::run_status(root, all, json),
        Commands::Init {
            extension,
            all,
            overwrite,
            json,
        } => commands::run_init(root, extension.as_deref(), all, overwrite, json),
        Commands::Diff { name, collection } => {
            commands::run_diff(root, &name, collection.as_deref())
        }
        Commands::Import { json } => commands::run_import(root, json),
        Commands::Snapshot { extension } => commands::run_snapshot(root, extension.as_deref()),
        Commands::SnapshotDelete => commands::run_snapshot_delete(root),
    }
}
