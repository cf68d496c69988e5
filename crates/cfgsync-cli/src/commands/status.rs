//! Status command implementation

use std::path::Path;

use colored::Colorize;

use cfgsync_core::{ChangeOp, FullChangelist};

use crate::context::SiteContext;
use crate::error::Result;

/// Run the status command
pub fn run_status(root: &Path, all: bool, json: bool) -> Result<()> {
    let context = SiteContext::load(root)?;
    let changes = context.engine()?.full_changelist(!all)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print_status(&changes, all);
    }
    Ok(())
}

fn print_status(changes: &FullChangelist, all: bool) {
    if changes.is_empty() {
        println!("{} Nothing to reconcile.", "OK".green().bold());
        if !all {
            println!(
                "Run {} to include changes to customized items.",
                "config-sync status --all".cyan()
            );
        }
        return;
    }

    println!("{}", "Pending changes".bold());
    for (kind, extensions) in changes {
        for (id, set) in extensions {
            println!();
            println!("{}:{}", kind.to_string().dimmed(), id.cyan());
            for changelist in set.iter() {
                for (op, name) in changelist.entries() {
                    let name = changelist.collection.qualify(name);
                    match op {
                        ChangeOp::Create => println!("  {} {}", "+".green(), name.green()),
                        ChangeOp::Update => println!("  {} {}", "~".yellow(), name.yellow()),
                        ChangeOp::Delete => println!("  {} {}", "-".red(), name.red()),
                        ChangeOp::Rename => println!("  {} {}", ">".blue(), name.blue()),
                    }
                }
            }
            for issue in set.issues() {
                println!("  {} {}", "!".red(), issue);
            }
        }
    }

    println!();
    println!("Run {} to stage these changes.", "config-sync init".cyan());
}
