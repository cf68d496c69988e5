//! Semantic diff types and computation

use serde::Serialize;
use serde_json::Value;
use similar::TextDiff;

use crate::Result;

/// Maximum recursion depth for diff operations
const MAX_DIFF_DEPTH: usize = 128;

/// Result of comparing two configuration values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticDiff {
    /// Are the values semantically equivalent?
    pub is_equivalent: bool,
    /// List of semantic changes
    pub changes: Vec<SemanticChange>,
    /// Similarity ratio (0.0 to 1.0)
    pub similarity: f64,
}

impl SemanticDiff {
    /// Create a diff indicating values are equivalent
    pub fn equivalent() -> Self {
        Self {
            is_equivalent: true,
            changes: Vec::new(),
            similarity: 1.0,
        }
    }

    /// Compute a semantic diff between two values
    ///
    /// This recursively compares two values and tracks all changes
    /// with their paths (e.g., "page.front" for nested keys).
    pub fn compute(old: &Value, new: &Value) -> Self {
        let mut changes = Vec::new();
        diff_values(old, new, String::new(), &mut changes, 0);

        Self {
            is_equivalent: changes.is_empty(),
            changes,
            similarity: compute_similarity(old, new),
        }
    }

    /// Paths of all changes, in discovery order
    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(SemanticChange::path).collect()
    }
}

impl Default for SemanticDiff {
    fn default() -> Self {
        Self::equivalent()
    }
}

/// A semantic change between two values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SemanticChange {
    /// Key/path added
    Added { path: String, value: Value },
    /// Key/path removed
    Removed { path: String, value: Value },
    /// Value changed at path
    Modified { path: String, old: Value, new: Value },
}

impl SemanticChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Modified { path, .. } => {
                path
            }
        }
    }
}

/// Join a mapping key onto a parent path.
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Render a unified diff of two values as YAML text.
///
/// Used for human review of staged changes.
pub fn render_unified(old: &Value, new: &Value, old_label: &str, new_label: &str) -> Result<String> {
    let old_text = serde_yaml::to_string(old)?;
    let new_text = serde_yaml::to_string(new)?;

    Ok(TextDiff::from_lines(&old_text, &new_text)
        .unified_diff()
        .context_radius(3)
        .header(old_label, new_label)
        .to_string())
}

/// Recursively diff two values, collecting changes with path tracking
fn diff_values(
    old: &Value,
    new: &Value,
    path: String,
    changes: &mut Vec<SemanticChange>,
    depth: usize,
) {
    // Depth limit: treat deeply nested differences as a single modification
    if depth > MAX_DIFF_DEPTH {
        if old != new {
            changes.push(SemanticChange::Modified {
                path,
                old: old.clone(),
                new: new.clone(),
            });
        }
        return;
    }

    match (old, new) {
        (Value::Object(old_obj), Value::Object(new_obj)) => {
            for (key, old_value) in old_obj {
                let child = child_path(&path, key);
                match new_obj.get(key) {
                    Some(new_value) => {
                        diff_values(old_value, new_value, child, changes, depth + 1);
                    }
                    None => changes.push(SemanticChange::Removed {
                        path: child,
                        value: old_value.clone(),
                    }),
                }
            }

            for (key, new_value) in new_obj {
                if !old_obj.contains_key(key) {
                    changes.push(SemanticChange::Added {
                        path: child_path(&path, key),
                        value: new_value.clone(),
                    });
                }
            }
        }

        (Value::Array(old_arr), Value::Array(new_arr)) => {
            let max_len = old_arr.len().max(new_arr.len());
            for i in 0..max_len {
                let child = format!("{}[{}]", path, i);
                match (old_arr.get(i), new_arr.get(i)) {
                    (Some(old_val), Some(new_val)) => {
                        diff_values(old_val, new_val, child, changes, depth + 1);
                    }
                    (Some(old_val), None) => changes.push(SemanticChange::Removed {
                        path: child,
                        value: old_val.clone(),
                    }),
                    (None, Some(new_val)) => changes.push(SemanticChange::Added {
                        path: child,
                        value: new_val.clone(),
                    }),
                    (None, None) => unreachable!(),
                }
            }
        }

        _ => {
            if old != new {
                changes.push(SemanticChange::Modified {
                    path,
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }
}

/// Compute similarity ratio between two values
///
/// Serializes both values and uses similar::TextDiff::ratio() for a quick
/// estimate.
fn compute_similarity(old: &Value, new: &Value) -> f64 {
    if old == new {
        return 1.0;
    }

    let old_str = serde_json::to_string(old).unwrap_or_default();
    let new_str = serde_json::to_string(new).unwrap_or_default();

    TextDiff::from_chars(&old_str, &new_str).ratio() as f64
}
