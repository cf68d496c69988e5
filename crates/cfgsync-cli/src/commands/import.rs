//! Import command implementation

use std::path::Path;

use colored::Colorize;

use crate::context::SiteContext;
use crate::error::Result;

/// Run the import command
pub fn run_import(root: &Path, json: bool) -> Result<()> {
    let context = SiteContext::load(root)?;
    let report = context.engine()?.import_staging()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.changed() == 0 {
        println!("{} Active configuration already matches staging.", "OK".green().bold());
    } else {
        println!("{} {} item(s) changed", "Imported".green().bold(), report.changed());
        for (label, names) in [
            ("created", &report.created),
            ("updated", &report.updated),
            ("renamed", &report.renamed),
            ("deleted", &report.deleted),
        ] {
            for name in names {
                println!("  {} {}", label.dimmed(), name);
            }
        }
    }
    for issue in &report.issues {
        println!("  {} {}", "warning:".yellow(), issue);
    }
    if let Some(snapshot) = &report.snapshot {
        println!(
            "Snapshot taken: {} item(s) from {} extension(s)",
            snapshot.items,
            snapshot.extensions.len()
        );
    }
    Ok(())
}
