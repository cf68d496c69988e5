//! Diff command implementation
//!
//! Shows what `import` would change for one item.

use std::path::Path;

use colored::Colorize;
use serde_json::Value;

use cfgsync_content::diff::render_unified;
use cfgsync_store::{Collection, ConfigStore};

use crate::context::SiteContext;
use crate::error::{CliError, Result};

/// Run the diff command
pub fn run_diff(root: &Path, name: &str, collection: Option<&str>) -> Result<()> {
    let context = SiteContext::load(root)?;
    let collection = collection
        .map(Collection::new)
        .unwrap_or_else(Collection::default_collection);
    let stores = context.stores();
    let active = stores.active.with_collection(&collection).read(name)?;
    let staged = stores.staging.with_collection(&collection).read(name)?;
    let qualified = collection.qualify(name);

    let (active, staged) = match (active, staged) {
        (None, None) => {
            return Err(CliError::user(format!(
                "Item {qualified} is neither active nor staged"
            )));
        }
        (active, staged) => (active.unwrap_or(Value::Null), staged.unwrap_or(Value::Null)),
    };

    let differ = context.settings().differ();
    if differ.same(&active, &staged) {
        println!("{} {} is unchanged in staging.", "OK".green().bold(), qualified);
        return Ok(());
    }

    let rendered = render_unified(
        &active,
        &staged,
        &format!("active/{qualified}"),
        &format!("staging/{qualified}"),
    )?;
    for line in rendered.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}
