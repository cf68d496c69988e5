//! Command implementations for cfgsync-cli

pub mod diff;
pub mod import;
pub mod init;
pub mod snapshot;
pub mod status;

pub use diff::run_diff;
pub use import::run_import;
pub use init::run_init;
pub use snapshot::{run_snapshot, run_snapshot_delete};
pub use status::run_status;

use cfgsync_extensions::ExtensionRef;

use crate::error::Result;

/// Parse a `--extension kind:id` argument.
pub(crate) fn parse_extension(reference: Option<&str>) -> Result<Option<ExtensionRef>> {
    Ok(reference.map(str::parse::<ExtensionRef>).transpose()?)
}
