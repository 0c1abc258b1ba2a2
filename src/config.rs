//! # Metadata Document Schema
//!
//! This module defines the data structures for the `ci.conf` metadata
//! document and the typed records the resolver produces from it.
//!
//! ## Document Layout
//!
//! ```yaml
//! substitutions:
//!   "$name": name
//! active_configs:
//!   lubuntu:
//!     default:
//!       type: unstable
//!       packaging_url: https://git.example.org/packaging/$name
//!       # ...remaining defaults
//!     repositories:
//!       - name: lxqt-panel
//!   merger:
//!     default:
//!       type: merger
//!       parent: lubuntu
//!       cascade: [ubuntu/master, ubuntu/focal]
//! ```
//!
//! Raw groups keep their `default` block and repository entries as untyped
//! YAML mappings, because default inheritance and key validation have to
//! happen before the records can be deserialized into
//! [`RepositoryMetadata`]. Group and record order is preserved as written.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;

/// Keys every repository record must carry after default inheritance.
pub const REQUIRED_KEYS: &[&str] = &[
    "name",
    "packaging_url",
    "packaging_branch_stable",
    "packaging_branch_unstable",
    "upload_target_stable",
    "upload_target_unstable",
    "releases",
];

/// Keys a repository record may carry. These are never inherited.
pub const OPTIONAL_KEYS: &[&str] = &["default_branch", "upstream_url", "upstream_branch", "cascade"];

/// Keys that only make sense in a group's `default` block.
pub const GROUP_KEYS: &[&str] = &["type", "parent"];

/// Keys whose values are lists rather than strings.
pub const LIST_KEYS: &[&str] = &["releases", "cascade"];

/// Whether `key` is a valid repository record key.
pub fn is_record_key(key: &str) -> bool {
    REQUIRED_KEYS.contains(&key) || OPTIONAL_KEYS.contains(&key)
}

/// Whether `key` names a string-valued record field.
pub fn is_string_key(key: &str) -> bool {
    is_record_key(key) && !LIST_KEYS.contains(&key)
}

/// Classification of an active config group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// Branch cascades for the repositories of a parent group.
    Merger,
    /// Package builds from the stable packaging branch.
    Stable,
    /// Package builds from the unstable packaging branch.
    Unstable,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Merger => "merger",
            ConfigType::Stable => "stable",
            ConfigType::Unstable => "unstable",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One packaged source repository, after inheritance and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryMetadata {
    /// Unique identifier within its config group.
    pub name: String,
    /// Location of the packaging sources.
    pub packaging_url: String,
    pub packaging_branch_stable: String,
    pub packaging_branch_unstable: String,
    pub upload_target_stable: String,
    pub upload_target_unstable: String,
    /// Target releases, in declaration order. Never empty.
    pub releases: Vec<String>,
    /// Branch considered canonical for merge cascades.
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub upstream_url: Option<String>,
    #[serde(default)]
    pub upstream_branch: Option<String>,
    /// Fast-forward merge chain. Inherited from a merger group's default.
    #[serde(default)]
    pub cascade: Option<Vec<String>>,
}

/// A named group of repositories sharing one set of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveConfig {
    pub name: String,
    pub config_type: ConfigType,
    /// For merger groups, the group whose repositories are cascaded.
    pub parent: Option<String>,
    /// Default cascade for repositories that do not declare one.
    pub cascade: Option<Vec<String>>,
    /// The raw `default` block, kept for reporting.
    pub defaults: Mapping,
    /// Empty for merger groups.
    pub repositories: Vec<RepositoryMetadata>,
}

/// A group as written in the document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawGroup {
    #[serde(default)]
    pub default: Mapping,
    #[serde(default)]
    pub repositories: Vec<Mapping>,
}

/// The metadata document as written, before resolution.
#[derive(Debug, Clone, Default)]
pub struct MetadataDocument {
    /// Token to source-field rewrites, in declaration order.
    pub substitutions: Vec<(String, String)>,
    /// Groups in declaration order.
    pub groups: Vec<(String, RawGroup)>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    substitutions: Mapping,
    active_configs: Mapping,
}

/// Parses the text of a metadata document.
pub fn parse(yaml_content: &str) -> Result<MetadataDocument> {
    let raw: RawDocument = serde_yaml::from_str(yaml_content)?;

    let mut substitutions = Vec::with_capacity(raw.substitutions.len());
    for (token, field) in raw.substitutions {
        match (token, field) {
            (Value::String(token), Value::String(field)) if !token.is_empty() => {
                substitutions.push((token, field));
            }
            (token, _) => {
                return Err(Error::schema(
                    "",
                    "",
                    format!(
                        "substitution entries must map a non-empty token to a field name, got {}",
                        describe(&token)
                    ),
                ));
            }
        }
    }

    let mut groups = Vec::with_capacity(raw.active_configs.len());
    for (name, group) in raw.active_configs {
        let name = match name {
            Value::String(name) => name,
            other => {
                return Err(Error::schema(
                    "",
                    "",
                    format!("group names must be strings, got {}", describe(&other)),
                ));
            }
        };
        let group: RawGroup = match group {
            Value::Null => RawGroup::default(),
            other => serde_yaml::from_value(other)
                .map_err(|e| Error::schema(&name, "", e.to_string()))?,
        };
        groups.push((name, group));
    }

    Ok(MetadataDocument {
        substitutions,
        groups,
    })
}

/// Loads and parses a metadata document from disk.
pub fn from_file(path: &Path) -> Result<MetadataDocument> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Short human description of a YAML value, for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("'{}'", s),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(t) => format!("tagged value {}", t.tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
substitutions:
  "$name": name
active_configs:
  lubuntu:
    default:
      type: unstable
      packaging_url: https://git.example.org/$name
    repositories:
      - name: lxqt-panel
      - name: pcmanfm-qt
  merger:
    default:
      type: merger
      parent: lubuntu
"#;

    #[test]
    fn test_parse_preserves_group_and_record_order() {
        let doc = parse(DOCUMENT).unwrap();
        let names: Vec<&str> = doc.groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["lubuntu", "merger"]);

        let lubuntu = &doc.groups[0].1;
        assert_eq!(lubuntu.repositories.len(), 2);
        assert_eq!(
            lubuntu.repositories[1].get("name").and_then(Value::as_str),
            Some("pcmanfm-qt")
        );
    }

    #[test]
    fn test_parse_substitutions() {
        let doc = parse(DOCUMENT).unwrap();
        assert_eq!(
            doc.substitutions,
            vec![("$name".to_string(), "name".to_string())]
        );
    }

    #[test]
    fn test_parse_merger_group_without_repositories() {
        let doc = parse(DOCUMENT).unwrap();
        let merger = &doc.groups[1].1;
        assert!(merger.repositories.is_empty());
        assert_eq!(merger.default.get("parent").and_then(Value::as_str), Some("lubuntu"));
    }

    #[test]
    fn test_parse_rejects_unknown_top_level_key() {
        let result = parse("active_configs: {}\nrepositories: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_group_key() {
        let yaml = r#"
active_configs:
  main:
    defaults: {}
"#;
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("group 'main'"));
    }

    #[test]
    fn test_parse_requires_active_configs() {
        assert!(parse("substitutions: {}\n").is_err());
    }

    #[test]
    fn test_parse_rejects_non_string_substitution() {
        let yaml = r#"
substitutions:
  "$name": [name]
active_configs: {}
"#;
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("substitution entries"));
    }

    #[test]
    fn test_key_sets() {
        assert!(is_record_key("packaging_url"));
        assert!(is_record_key("cascade"));
        assert!(!is_record_key("type"));
        assert!(is_string_key("name"));
        assert!(!is_string_key("releases"));
    }

    #[test]
    fn test_config_type_deserialize() {
        let t: ConfigType = serde_yaml::from_str("merger").unwrap();
        assert_eq!(t, ConfigType::Merger);
        assert!(serde_yaml::from_str::<ConfigType>("nightly").is_err());
        assert_eq!(ConfigType::Unstable.to_string(), "unstable");
    }
}
