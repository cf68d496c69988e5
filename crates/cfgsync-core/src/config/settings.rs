//! Settings parsing for `settings.toml` files

use serde::{Deserialize, Serialize};

use cfgsync_content::ConfigDiffer;
use cfgsync_content::differ::DEFAULT_IGNORED_KEYS;

use crate::merge::ConflictPolicy;
use crate::{Error, Result};

/// Engine settings.
///
/// Every section and field is optional in TOML; missing values take the
/// defaults shown below.
///
/// ```toml
/// [diff]
/// ignored_keys = ["uuid", "_core"]
///
/// [items]
/// identity_key = "uuid"
/// dependency_path = "dependencies.config"
/// assign_identity = true
///
/// [merge]
/// conflict = "local-wins"
///
/// [providers]
/// require_enabled = true
/// always_enabled = ["core"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub diff: DiffSettings,
    pub items: ItemSettings,
    pub merge: MergeSettings,
    pub providers: ProviderSettings,
}

/// Semantic comparison settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Top-level keys that never count as a change
    pub ignored_keys: Vec<String>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            ignored_keys: DEFAULT_IGNORED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Item structure settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSettings {
    /// Top-level key holding an item's stable identity
    pub identity_key: String,
    /// Dotted path of the declared dependency list
    pub dependency_path: String,
    /// Give created items a fresh identity when upstream ships none
    pub assign_identity: bool,
}

impl Default for ItemSettings {
    fn default() -> Self {
        Self {
            identity_key: "uuid".to_string(),
            dependency_path: "dependencies.config".to_string(),
            assign_identity: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub conflict: ConflictPolicy,
}

/// Which extensions may provide new items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Drop creates whose provider prefix is not an enabled extension
    pub require_enabled: bool,
    /// Providers treated as enabled regardless of the registry
    pub always_enabled: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            require_enabled: true,
            always_enabled: vec!["core".to_string()],
        }
    }
}

impl SyncSettings {
    /// Parse settings from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The differ these settings describe
    pub fn differ(&self) -> ConfigDiffer {
        ConfigDiffer::new(self.diff.ignored_keys.iter().cloned())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.items.identity_key.is_empty() {
            return Err(Error::InvalidSetting {
                key: "items.identity_key".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.items.dependency_path.is_empty()
            || self.items.dependency_path.split('.').any(str::is_empty)
        {
            return Err(Error::InvalidSetting {
                key: "items.dependency_path".into(),
                reason: format!("'{}' is not a dotted path", self.items.dependency_path),
            });
        }
        Ok(())
    }
}
