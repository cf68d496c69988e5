//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// config-sync - Reconcile extension-provided configuration with a site
#[derive(Parser, Debug)]
#[command(name = "config-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Site root directory (defaults to the current directory)
    #[arg(long, global = true, env = "CONFIG_SYNC_ROOT")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List pending changes from enabled extensions
    ///
    /// By default only changes that cannot overwrite local customization
    /// are listed.
    Status {
        /// Include changes that would overwrite local customization
        #[arg(long)]
        all: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Reseed staging from active and stage pending changes
    ///
    /// Examples:
    ///   config-sync init                          # Safe changes, every extension
    ///   config-sync init --extension module:node  # One extension
    ///   config-sync init --all --overwrite        # Everything, upstream values
    Init {
        /// Only this extension, as kind:id
        #[arg(short, long)]
        extension: Option<String>,

        /// Include changes that would overwrite local customization
        #[arg(long)]
        all: bool,

        /// Replace updated items with the shipped value instead of merging
        #[arg(long)]
        overwrite: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how staging differs from active for one item
    Diff {
        /// Item name, e.g. system.site
        name: String,

        /// Collection holding the item
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Commit staging to active, then take a full snapshot
    Import {
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record shipped and active values as the new baseline
    Snapshot {
        /// Only this extension, as kind:id
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Delete the snapshot
    SnapshotDelete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init_flags() {
        let cli = Cli::parse_from([
            "config-sync",
            "init",
            "--extension",
            "module:node",
            "--all",
            "--overwrite",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Init {
                extension: Some("module:node".to_string()),
                all: true,
                overwrite: true,
                json: false,
            })
        );
    }

    #[test]
    fn root_is_global() {
        let cli = Cli::parse_from(["config-sync", "status", "--root", "/srv/site"]);
        assert_eq!(cli.root, Some(PathBuf::from("/srv/site")));
    }

    #[test]
    fn parse_snapshot_delete() {
        let cli = Cli::parse_from(["config-sync", "snapshot-delete"]);
        assert_eq!(cli.command, Some(Commands::SnapshotDelete));
    }
}
