//! Init command implementation
//!
//! Reseeds staging from active and writes the reconciled values of pending
//! changes into it. Nothing reaches active until `import`.

use std::path::Path;

use colored::Colorize;

use cfgsync_core::{InitOptions, ReconcileReport, ReconcileStatus};

use super::parse_extension;
use crate::context::SiteContext;
use crate::error::Result;

/// Run the init command
pub fn run_init(
    root: &Path,
    extension: Option<&str>,
    all: bool,
    overwrite: bool,
    json: bool,
) -> Result<()> {
    let extension = parse_extension(extension)?;
    let context = SiteContext::load(root)?;
    let engine = context.engine()?;
    let options = InitOptions {
        safe_only: !all,
        retain_local: !overwrite,
    };

    let report = match extension {
        Some(reference) => engine.initialize_extension_with(reference.kind, &reference.id, &options)?,
        None => engine.initialize_all_with(&options)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    let status = match report.status {
        ReconcileStatus::Clean => report.status.to_string().green(),
        ReconcileStatus::Partial => report.status.to_string().yellow(),
        ReconcileStatus::Conflicted => report.status.to_string().red(),
    };
    println!(
        "{} {} (staged {}, skipped {}, conflicted {})",
        "Staging".bold(),
        status.bold(),
        report.applied.len(),
        report.skipped.len(),
        report.conflicted.len()
    );

    for outcome in &report.applied {
        println!("  {} {} {}", "+".green(), outcome.op, outcome.name);
    }
    for outcome in &report.skipped {
        let detail = outcome.detail.as_deref().unwrap_or("skipped");
        println!(
            "  {} {} {} ({})",
            "-".yellow(),
            outcome.op,
            outcome.name,
            detail.dimmed()
        );
        if outcome.proposed.is_some() {
            let note = match outcome.conflicts.len() {
                0 => "clean merge proposed".to_string(),
                n => format!("merge proposed with {n} conflict(s)"),
            };
            println!("      {}", note.dimmed());
        }
    }
    for item in &report.conflicted {
        let paths: Vec<String> = item.conflicts.iter().map(ToString::to_string).collect();
        println!("  {} {} at {}", "!".red(), item.name, paths.join(", "));
    }
    for warning in &report.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }

    if report.proposals().next().is_some() {
        println!();
        println!(
            "Held-back updates are listed with {}; stage them with {}.",
            "--json".cyan(),
            "config-sync init --all".cyan()
        );
    }
    if !report.applied.is_empty() {
        println!();
        println!(
            "Review with {} then run {}.",
            "config-sync diff <name>".cyan(),
            "config-sync import".cyan()
        );
    }
}
