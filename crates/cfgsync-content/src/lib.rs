//! Configuration value comparison and diffing for config-sync
//!
//! - [`ConfigDiffer`]: semantic equality that ignores bookkeeping fields
//! - [`SemanticDiff`]: path-level changes between two values, for reporting
//! - [`value`]: helpers for reading identity and dependency fields

pub mod diff;
pub mod differ;
pub mod error;
pub mod value;

pub use cfgsync_store::ConfigValue;
pub use diff::{SemanticChange, SemanticDiff};
pub use differ::{ConfigDiffer, DiffMode};
pub use error::{Error, Result};
