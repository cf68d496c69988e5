//! On-disk encodings for file-backed stores

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::ConfigValue;
use crate::{Error, Result};

/// Encoding of item files in a [`FileStore`](crate::FileStore).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// `.yml` files
    #[default]
    Yaml,
    /// `.json` files
    Json,
    /// `.toml` files
    Toml,
}

impl StoreFormat {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }

    /// Detect a format from a file extension.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_lowercase().as_str() {
            "yml" | "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        }
    }

    /// Decode the content of the file holding item `name`.
    pub fn decode(&self, name: &str, content: &str) -> Result<ConfigValue> {
        let parse_error = |message: String| Error::ConfigParse {
            name: name.to_string(),
            format: self.label().into(),
            message,
        };

        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
            Self::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
            Self::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Encode item `name` for writing.
    pub fn encode(&self, name: &str, value: &ConfigValue) -> Result<String> {
        let serialize_error = |message: String| Error::ConfigSerialize {
            name: name.to_string(),
            format: self.label().into(),
            message,
        };

        match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| serialize_error(e.to_string())),
            Self::Json => serde_json::to_string_pretty(value)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| serialize_error(e.to_string())),
            Self::Toml => {
                toml::to_string_pretty(value).map_err(|e| serialize_error(e.to_string()))
            }
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for StoreFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(StoreFormat::Yaml)]
    #[case(StoreFormat::Json)]
    #[case(StoreFormat::Toml)]
    fn encoded_items_decode_to_the_same_value(#[case] format: StoreFormat) {
        let value = json!({
            "name": "Site",
            "page": {"front": "/node", "403": ""},
            "langcodes": ["en", "fr"],
            "weight": 3,
            "status": true
        });

        let text = format.encode("system.site", &value).unwrap();
        assert_eq!(format.decode("system.site", &text).unwrap(), value);
    }

    #[test]
    fn yaml_preserves_key_order() {
        let text = "zeta: 1\nalpha: 2\nmid: 3\n";
        let value = StoreFormat::Yaml.decode("x.y", text).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn malformed_content_is_a_parse_error() {
        let err = StoreFormat::Json.decode("system.site", "{not json").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { ref name, .. } if name == "system.site"));
    }

    #[test]
    fn toml_cannot_hold_null() {
        let err = StoreFormat::Toml
            .encode("system.site", &json!({"slogan": null}))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigSerialize { .. }));
    }

    #[test]
    fn from_extension_accepts_yaml_aliases() {
        assert_eq!(StoreFormat::from_extension("YAML").unwrap(), StoreFormat::Yaml);
        assert_eq!("yml".parse::<StoreFormat>().unwrap(), StoreFormat::Yaml);
        assert!(StoreFormat::from_extension("ini").is_err());
    }
}
