//! Extension kinds and `kind:id` references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind of an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    /// A module.
    Module,
    /// A theme.
    Theme,
    /// An install profile. Behaves like a module that is always enabled.
    Profile,
}

impl ExtensionKind {
    /// Every kind, in processing order.
    pub const ALL: [ExtensionKind; 3] = [Self::Module, Self::Theme, Self::Profile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Theme => "theme",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtensionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "module" => Ok(Self::Module),
            "theme" => Ok(Self::Theme),
            "profile" => Ok(Self::Profile),
            other => Err(Error::InvalidKind(other.to_string())),
        }
    }
}

/// A `kind:id` reference to one extension, e.g. `module:system`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtensionRef {
    pub kind: ExtensionKind,
    pub id: String,
}

impl ExtensionRef {
    pub fn new(kind: ExtensionKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ExtensionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ExtensionRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidReference(s.to_string()))?;
        if id.is_empty() {
            return Err(Error::InvalidReference(s.to_string()));
        }
        Ok(Self::new(kind.parse()?, id))
    }
}

/// Validate an extension identifier (lowercase machine name).
pub fn validate_extension_id(id: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("name is empty"));
    }
    if !id.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid("only lowercase letters, digits and '_' are allowed"));
    }
    Ok(())
}
