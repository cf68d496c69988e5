//! Semantic equality of configuration items

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diff::SemanticDiff;

/// Keys ignored by default: the identity field and the shipped-config
/// bookkeeping block.
pub const DEFAULT_IGNORED_KEYS: &[&str] = &["uuid", "_core"];

/// How strictly two values are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// Ignore the configured top-level bookkeeping keys.
    #[default]
    Semantic,
    /// Compare everything.
    Strict,
}

/// Compares configuration values for semantic equality.
///
/// In [`DiffMode::Semantic`] the configured keys are removed from the top
/// level of both items before they are compared. Mapping key order never
/// matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiffer {
    mode: DiffMode,
    ignored_keys: Vec<String>,
}

impl Default for ConfigDiffer {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_KEYS.iter().map(|k| k.to_string()))
    }
}

impl ConfigDiffer {
    /// A semantic differ ignoring `ignored_keys`.
    pub fn new<I, S>(ignored_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: DiffMode::Semantic,
            ignored_keys: ignored_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// A differ that compares every field.
    pub fn strict() -> Self {
        Self {
            mode: DiffMode::Strict,
            ignored_keys: Vec::new(),
        }
    }

    pub fn mode(&self) -> DiffMode {
        self.mode
    }

    pub fn ignored_keys(&self) -> &[String] {
        &self.ignored_keys
    }

    /// Whether a top-level key is bookkeeping rather than content.
    pub fn is_ignored(&self, key: &str) -> bool {
        self.mode == DiffMode::Semantic && self.ignored_keys.iter().any(|k| k == key)
    }

    /// Whether two items are the same once bookkeeping keys are removed.
    pub fn same(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(a), Value::Object(b)) => {
                self.content_len(a) == self.content_len(b)
                    && a.iter()
                        .filter(|(key, _)| !self.is_ignored(key))
                        .all(|(key, value)| b.get(key) == Some(value))
            }
            _ => a == b,
        }
    }

    /// [`ConfigDiffer::same`] with absence as a distinct state.
    pub fn same_opt(&self, a: Option<&Value>, b: Option<&Value>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.same(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// A copy of `value` with the bookkeeping keys removed from its top level.
    pub fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !self.is_ignored(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Path-level changes between two items, bookkeeping keys excluded.
    pub fn diff(&self, old: &Value, new: &Value) -> SemanticDiff {
        if self.same(old, new) {
            return SemanticDiff::equivalent();
        }
        SemanticDiff::compute(&self.normalize(old), &self.normalize(new))
    }

    fn content_len(&self, map: &Map<String, Value>) -> usize {
        map.keys().filter(|key| !self.is_ignored(key)).count()
    }
}
