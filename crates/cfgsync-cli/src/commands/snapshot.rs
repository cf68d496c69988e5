//! Snapshot command implementations

use std::path::Path;

use colored::Colorize;

use super::parse_extension;
use crate::context::SiteContext;
use crate::error::Result;

/// Run the snapshot command
pub fn run_snapshot(root: &Path, extension: Option<&str>) -> Result<()> {
    let extension = parse_extension(extension)?;
    let engine = SiteContext::load(root)?.engine()?;

    let report = match extension {
        Some(reference) => engine.create_extension_snapshot(reference.kind, &reference.id)?,
        None => engine.create_full_snapshot()?,
    };

    println!(
        "{} {} item(s) from {} extension(s)",
        "Snapshot taken:".green().bold(),
        report.items,
        report.extensions.len()
    );
    for name in &report.skipped {
        println!("  {} {} (unreadable)", "warning:".yellow(), name);
    }
    Ok(())
}

/// Run the snapshot-delete command
pub fn run_snapshot_delete(root: &Path) -> Result<()> {
    SiteContext::load(root)?.engine()?.delete_snapshot()?;
    println!("{} Snapshot deleted.", "OK".green().bold());
    Ok(())
}
