//! Engine settings
//!
//! - [`SyncSettings`]: every tunable of the engine, parsed from TOML
//! - [`SettingsResolver`]: layers `settings.local.toml` over `settings.toml`

pub mod resolver;
pub mod settings;

pub use resolver::{LOCAL_SETTINGS_FILENAME, SETTINGS_FILENAME, SettingsResolver};
pub use settings::{
    DiffSettings, ItemSettings, MergeSettings, ProviderSettings, SyncSettings,
};
