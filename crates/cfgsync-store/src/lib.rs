//! Configuration item storage for config-sync
//!
//! Provides the [`ConfigStore`] trait that every part of the reconciliation
//! engine reads and writes through, plus two implementations:
//!
//! - [`MemoryStore`]: shared in-memory maps, cheap collection views
//! - [`FileStore`]: one file per item on disk, collections as sub-directories

pub mod error;
pub mod file;
pub mod format;
pub mod io;
pub mod memory;
pub mod store;

pub use error::{Error, Result};
pub use file::FileStore;
pub use format::StoreFormat;
pub use memory::MemoryStore;
pub use store::{
    Collection, ConfigStore, ConfigValue, collections_with_default, validate_name,
};
