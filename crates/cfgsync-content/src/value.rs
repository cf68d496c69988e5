//! Helpers for reading structural fields out of configuration values

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Human-readable name of a value's type.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Borrow the top-level mapping of item `name`.
///
/// Every configuration item is a mapping at its root; anything else is a
/// malformed value.
pub fn ensure_mapping<'a>(name: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| Error::NotAMapping {
        name: name.to_string(),
        found: type_name(value).to_string(),
    })
}

/// Get a value at a dotted path (e.g. `dependencies.config`).
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// The stable identity of an item, if it carries a non-null one.
pub fn identity<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .as_object()
        .and_then(|map| map.get(key))
        .filter(|id| !id.is_null())
}

/// Item names declared as dependencies at `path`.
///
/// A missing field means no dependencies. A present field must be a
/// sequence of strings.
pub fn declared_dependencies(name: &str, value: &Value, path: &str) -> Result<Vec<String>> {
    let invalid = |reason: String| Error::InvalidDependencies {
        name: name.to_string(),
        path: path.to_string(),
        reason,
    };

    match get_path(value, path) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(format!("expected string, found {}", type_name(item))))
            })
            .collect(),
        Some(other) => Err(invalid(format!(
            "expected sequence, found {}",
            type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn get_path_walks_mappings() {
        let value = json!({"dependencies": {"config": ["a.b"]}});
        assert_eq!(
            get_path(&value, "dependencies.config"),
            Some(&json!(["a.b"]))
        );
        assert_eq!(get_path(&value, "dependencies.module"), None);
        assert_eq!(get_path(&value, ""), Some(&value));
    }

    #[test]
    fn get_path_does_not_index_sequences() {
        let value = json!({"list": [{"a": 1}]});
        assert_eq!(get_path(&value, "list.a"), None);
    }

    #[test]
    fn ensure_mapping_rejects_scalars() {
        let err = ensure_mapping("system.site", &json!("text")).unwrap_err();
        assert!(err.to_string().contains("found string"));
        assert!(ensure_mapping("system.site", &json!({})).is_ok());
    }

    #[test]
    fn identity_ignores_null() {
        assert_eq!(identity(&json!({"uuid": "abc"}), "uuid"), Some(&json!("abc")));
        assert_eq!(identity(&json!({"uuid": null}), "uuid"), None);
        assert_eq!(identity(&json!({}), "uuid"), None);
    }

    #[test]
    fn declared_dependencies_reads_string_lists() {
        let value = json!({"dependencies": {"config": ["field.storage.body", "node.type.page"]}});
        assert_eq!(
            declared_dependencies("x.y", &value, "dependencies.config").unwrap(),
            vec!["field.storage.body", "node.type.page"]
        );
        assert!(
            declared_dependencies("x.y", &json!({}), "dependencies.config")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn declared_dependencies_rejects_non_lists() {
        let value = json!({"dependencies": {"config": "node.type.page"}});
        assert!(matches!(
            declared_dependencies("x.y", &value, "dependencies.config"),
            Err(Error::InvalidDependencies { .. })
        ));

        let value = json!({"dependencies": {"config": [1]}});
        assert!(declared_dependencies("x.y", &value, "dependencies.config").is_err());
    }
}
