//! Three-way merge of configuration items
//!
//! Mappings merge key by key. Every other value, sequences included, is a
//! leaf: it is taken whole from one side. Absence is a leaf state of its own,
//! so a key removed upstream is removed from the result when local left it
//! untouched.
//!
//! | ancestor vs local | ancestor vs upstream | result                  |
//! |-------------------|----------------------|-------------------------|
//! | equal             | equal                | local                   |
//! | equal             | differ               | upstream                |
//! | differ            | equal                | local                   |
//! | differ            | differ               | conflict, policy decides|
//!
//! Only the identity field is exempt: it always comes from local. Other keys
//! the differ ignores, such as `_core`, merge like any other key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cfgsync_content::diff::child_path;
use cfgsync_store::ConfigValue;

use crate::config::SyncSettings;

/// Which side wins when both changed the same leaf differently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the local customization.
    #[default]
    LocalWins,
    /// Take the shipped value.
    UpstreamWins,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalWins => write!(f, "local-wins"),
            Self::UpstreamWins => write!(f, "upstream-wins"),
        }
    }
}

/// A leaf both sides changed differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// Dotted path of the leaf. Empty for the item root.
    pub path: String,
    pub ancestor: Option<ConfigValue>,
    pub upstream: Option<ConfigValue>,
    pub local: Option<ConfigValue>,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// A merged value and the conflicts resolved to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub value: ConfigValue,
    pub conflicts: Vec<MergeConflict>,
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Computes a new item value from ancestor, upstream and local versions.
#[derive(Debug, Clone)]
pub struct ThreeWayMerger {
    identity_key: String,
    policy: ConflictPolicy,
}

impl Default for ThreeWayMerger {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

impl ThreeWayMerger {
    pub fn new(identity_key: impl Into<String>, policy: ConflictPolicy) -> Self {
        Self {
            identity_key: identity_key.into(),
            policy,
        }
    }

    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(settings.items.identity_key.clone(), settings.merge.conflict)
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Merge one item.
    ///
    /// `ancestor` is `None` when the item was never snapshotted. The identity
    /// field at the item root is never merged: it comes from local, or from
    /// upstream when local has none.
    pub fn merge(
        &self,
        ancestor: Option<&ConfigValue>,
        upstream: &ConfigValue,
        local: &ConfigValue,
    ) -> MergeOutcome {
        let mut conflicts = Vec::new();

        let value = if self.same_apart_from_identity(upstream, local) {
            local.clone()
        } else {
            match (upstream, local) {
                (Value::Object(upstream_map), Value::Object(local_map)) => {
                    let ancestor_map = ancestor.and_then(Value::as_object);
                    let local_unchanged =
                        ancestor.is_some_and(|a| self.same_apart_from_identity(a, local));
                    Value::Object(self.merge_maps(
                        "",
                        ancestor_map,
                        upstream_map,
                        local_map,
                        local_unchanged,
                        true,
                        &mut conflicts,
                    ))
                }
                _ => self
                    .merge_node("", ancestor, Some(upstream), Some(local), &mut conflicts)
                    .unwrap_or(Value::Null),
            }
        };

        MergeOutcome { value, conflicts }
    }

    /// Merge one value of any shape. `None` is absence.
    fn merge_node(
        &self,
        path: &str,
        ancestor: Option<&Value>,
        upstream: Option<&Value>,
        local: Option<&Value>,
        conflicts: &mut Vec<MergeConflict>,
    ) -> Option<Value> {
        if upstream == local {
            return local.cloned();
        }
        if ancestor == local {
            return upstream.cloned();
        }
        if ancestor == upstream {
            return local.cloned();
        }

        // Both changed. Two mappings still merge key by key.
        if let (Some(Value::Object(upstream_map)), Some(Value::Object(local_map))) =
            (upstream, local)
        {
            let ancestor_map = ancestor.and_then(Value::as_object);
            return Some(Value::Object(self.merge_maps(
                path,
                ancestor_map,
                upstream_map,
                local_map,
                false,
                false,
                conflicts,
            )));
        }

        tracing::debug!(path, policy = %self.policy, "Merge conflict");
        conflicts.push(MergeConflict {
            path: path.to_string(),
            ancestor: ancestor.cloned(),
            upstream: upstream.cloned(),
            local: local.cloned(),
        });
        match self.policy {
            ConflictPolicy::LocalWins => local.cloned(),
            ConflictPolicy::UpstreamWins => upstream.cloned(),
        }
    }

    /// Merge two mappings over the union of their keys.
    ///
    /// Keys keep local's order, or upstream's when local is unchanged, and
    /// keys only the other side has are appended.
    #[allow(clippy::too_many_arguments)]
    fn merge_maps(
        &self,
        path: &str,
        ancestor: Option<&Map<String, Value>>,
        upstream: &Map<String, Value>,
        local: &Map<String, Value>,
        local_unchanged: bool,
        at_root: bool,
        conflicts: &mut Vec<MergeConflict>,
    ) -> Map<String, Value> {
        let (primary, secondary) = if local_unchanged {
            (upstream, local)
        } else {
            (local, upstream)
        };
        let keys = primary
            .keys()
            .chain(secondary.keys().filter(|key| !primary.contains_key(*key)));

        let mut merged = Map::new();
        for key in keys {
            let local_value = local.get(key);
            let upstream_value = upstream.get(key);

            let value = if at_root && *key == self.identity_key {
                local_value.or(upstream_value).cloned()
            } else {
                self.merge_node(
                    &child_path(path, key),
                    ancestor.and_then(|map| map.get(key)),
                    upstream_value,
                    local_value,
                    conflicts,
                )
            };

            if let Some(value) = value {
                merged.insert(key.clone(), value);
            }
        }
        merged
    }

    /// Exact equality, except for the identity field at the root.
    fn same_apart_from_identity(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(a), Value::Object(b)) => {
                fn content<'a>(
                    map: &'a Map<String, Value>,
                    identity_key: &str,
                ) -> BTreeMap<&'a String, &'a Value> {
                    map.iter()
                        .filter(|(key, _)| **key != identity_key)
                        .collect::<BTreeMap<_, _>>()
                }
                content(a, &self.identity_key) == content(b, &self.identity_key)
            }
            _ => a == b,
        }
    }
}
