//! # Metadata Resolution
//!
//! Turns a parsed [`MetadataDocument`] into validated [`ActiveConfig`]
//! groups. Every failure here is fatal for the whole run, and resolution
//! happens before anything talks to the job store, so an invalid document
//! is never partially applied.
//!
//! ## Process
//!
//! For each group, in document order:
//!
//! 1.  **Default block**: every key must be a record key or a group key;
//!     `type` is mandatory and `parent` is only allowed on merger groups.
//! 2.  **Inheritance**: required keys a record lacks are copied from the
//!     group's `default`. Optional keys are never inherited.
//! 3.  **Key check**: a record carrying any key outside the required and
//!     optional sets rejects the document.
//! 4.  **Substitution**: each `token -> field` entry rewrites `token` in
//!     every string value of the record with the record's own `field`.
//! 5.  **Typing**: missing required keys, non-string values, empty or
//!     repeated releases, and repeated names are rejected.
//!
//! Merger groups skip steps 2-5; they borrow the repositories of the group
//! named by their `parent`, which must exist and must not itself be a
//! merger group.

use log::{debug, warn};
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeSet, HashMap};

use crate::config::{
    self, ActiveConfig, ConfigType, MetadataDocument, RawGroup, RepositoryMetadata, GROUP_KEYS,
    REQUIRED_KEYS,
};
use crate::error::{Error, Result};
use crate::suggestions;

/// The validated groups of one metadata document.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMetadata {
    /// Groups in document order.
    pub configs: Vec<ActiveConfig>,
}

impl ResolvedMetadata {
    /// Looks up a group by name.
    pub fn get(&self, name: &str) -> Option<&ActiveConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// Groups of the given type, in document order.
    pub fn of_type(&self, config_type: ConfigType) -> impl Iterator<Item = &ActiveConfig> {
        self.configs
            .iter()
            .filter(move |c| c.config_type == config_type)
    }

    /// The group a merger group cascades.
    pub fn parent_of(&self, merger: &ActiveConfig) -> Result<&ActiveConfig> {
        let parent = merger.parent.as_deref().ok_or_else(|| {
            Error::schema(&merger.name, "", "merger group has no 'parent' reference")
        })?;
        self.get(parent).ok_or_else(|| {
            Error::schema(
                &merger.name,
                "",
                format!("parent group '{}' does not exist", parent),
            )
        })
    }

    /// Total number of repository records across non-merger groups.
    pub fn repository_count(&self) -> usize {
        self.configs.iter().map(|c| c.repositories.len()).sum()
    }
}

/// Parses and resolves a metadata document in one step.
pub fn resolve_str(yaml_content: &str) -> Result<ResolvedMetadata> {
    resolve(&config::parse(yaml_content)?)
}

/// Validates and normalizes a parsed metadata document.
pub fn resolve(document: &MetadataDocument) -> Result<ResolvedMetadata> {
    for (_, field) in &document.substitutions {
        if !config::is_string_key(field) {
            return Err(Error::Schema {
                group: String::new(),
                record: String::new(),
                message: format!("substitution source '{}' is not a string field", field),
                hint: Some(suggestions::unknown_record_key(field)),
            });
        }
    }

    let mut seen = BTreeSet::new();
    let mut configs = Vec::with_capacity(document.groups.len());
    for (name, group) in &document.groups {
        if !seen.insert(name.as_str()) {
            return Err(Error::schema(name, "", "group is declared twice"));
        }
        configs.push(resolve_group(name, group, &document.substitutions)?);
    }

    let resolved = ResolvedMetadata { configs };
    for merger in resolved.of_type(ConfigType::Merger) {
        let parent = resolved.parent_of(merger)?;
        if parent.config_type == ConfigType::Merger {
            return Err(Error::schema(
                &merger.name,
                "",
                format!("parent group '{}' is itself a merger group", parent.name),
            ));
        }
    }

    debug!(
        "Resolved {} group(s) with {} repositories",
        resolved.configs.len(),
        resolved.repository_count()
    );
    Ok(resolved)
}

fn resolve_group(
    name: &str,
    group: &RawGroup,
    substitutions: &[(String, String)],
) -> Result<ActiveConfig> {
    for key in group.default.keys() {
        let key = key_str(name, "", key)?;
        if !config::is_record_key(key) && !GROUP_KEYS.contains(&key) {
            return Err(Error::Schema {
                group: name.to_string(),
                record: String::new(),
                message: format!("invalid key '{}' in default block", key),
                hint: Some(suggestions::unknown_default_key(key)),
            });
        }
    }

    let config_type: ConfigType = match group.default.get("type") {
        Some(value) => serde_yaml::from_value(value.clone()).map_err(|_| {
            Error::schema(
                name,
                "",
                format!(
                    "'type' must be one of merger, stable, unstable, got {}",
                    config::describe(value)
                ),
            )
        })?,
        None => return Err(Error::schema(name, "", "default block has no 'type'")),
    };

    let parent = optional_string(name, &group.default, "parent")?;
    let cascade = match group.default.get("cascade") {
        Some(value) => Some(string_list(name, "", "cascade", value)?),
        None => None,
    };

    if config_type != ConfigType::Merger {
        if parent.is_some() {
            return Err(Error::schema(
                name,
                "",
                "'parent' is only valid on merger groups",
            ));
        }
    } else {
        if parent.is_none() {
            return Err(Error::schema(
                name,
                "",
                "merger group has no 'parent' reference",
            ));
        }
        if !group.repositories.is_empty() {
            warn!(
                "Merger group '{}' lists {} repositories; they are ignored in favour of the parent's",
                name,
                group.repositories.len()
            );
        }
        return Ok(ActiveConfig {
            name: name.to_string(),
            config_type,
            parent,
            cascade,
            defaults: group.default.clone(),
            repositories: Vec::new(),
        });
    }

    let mut names = BTreeSet::new();
    let mut repositories = Vec::with_capacity(group.repositories.len());
    for (index, raw) in group.repositories.iter().enumerate() {
        let record = resolve_record(name, index, raw, &group.default, substitutions)?;
        if !names.insert(record.name.clone()) {
            return Err(Error::schema(
                name,
                &record.name,
                "repository name is declared twice",
            ));
        }
        repositories.push(record);
    }

    Ok(ActiveConfig {
        name: name.to_string(),
        config_type,
        parent,
        cascade,
        defaults: group.default.clone(),
        repositories,
    })
}

fn resolve_record(
    group: &str,
    index: usize,
    raw: &Mapping,
    defaults: &Mapping,
    substitutions: &[(String, String)],
) -> Result<RepositoryMetadata> {
    let label = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index + 1));

    let mut record = raw.clone();
    for key in REQUIRED_KEYS {
        if !record.contains_key(*key) {
            if let Some(value) = defaults.get(*key) {
                record.insert(Value::from(*key), value.clone());
            }
        }
    }

    for key in record.keys() {
        let key = key_str(group, &label, key)?;
        if !config::is_record_key(key) {
            return Err(Error::Schema {
                group: group.to_string(),
                record: label,
                message: format!("invalid key '{}'", key),
                hint: Some(suggestions::unknown_record_key(key)),
            });
        }
    }

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !record.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(Error::schema(
            group,
            &label,
            format!(
                "missing required key(s) with no group default: {}",
                missing.join(", ")
            ),
        ));
    }

    apply_substitutions(&mut record, substitutions)?;

    let metadata: RepositoryMetadata = serde_yaml::from_value(Value::Mapping(record))
        .map_err(|e| Error::schema(group, &label, e.to_string()))?;

    if metadata.releases.is_empty() {
        return Err(Error::schema(group, &label, "'releases' must not be empty"));
    }
    let mut releases = BTreeSet::new();
    for release in &metadata.releases {
        if !releases.insert(release.as_str()) {
            return Err(Error::schema(
                group,
                &label,
                format!("release '{}' is listed twice", release),
            ));
        }
    }

    Ok(metadata)
}

/// Rewrites every token in every string value of `record`.
///
/// Source values are captured before any rewriting and each string is
/// rewritten in a single pass, longest token first, so neither the order of
/// the table nor the content of a replacement changes what a token expands
/// to.
fn apply_substitutions(record: &mut Mapping, substitutions: &[(String, String)]) -> Result<()> {
    let mut replacements: HashMap<&str, String> = HashMap::new();
    for (token, field) in substitutions {
        if token.is_empty() {
            continue;
        }
        if let Some(value) = record.get(field.as_str()).and_then(Value::as_str) {
            replacements.insert(token.as_str(), value.to_string());
        }
    }
    if replacements.is_empty() {
        return Ok(());
    }

    let mut tokens: Vec<&str> = replacements.keys().copied().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = tokens
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&alternation)?;

    for (_, value) in record.iter_mut() {
        rewrite_value(value, &pattern, &replacements);
    }
    Ok(())
}

fn rewrite_value(value: &mut Value, pattern: &Regex, replacements: &HashMap<&str, String>) {
    match value {
        Value::String(s) => {
            if pattern.is_match(s) {
                let rewritten = pattern.replace_all(s, |caps: &Captures| {
                    replacements.get(&caps[0]).cloned().unwrap_or_default()
                });
                *s = rewritten.into_owned();
            }
        }
        Value::Sequence(items) => {
            for item in items {
                rewrite_value(item, pattern, replacements);
            }
        }
        _ => {}
    }
}

fn key_str<'a>(group: &str, record: &str, key: &'a Value) -> Result<&'a str> {
    key.as_str().ok_or_else(|| {
        Error::schema(
            group,
            record,
            format!("keys must be strings, got {}", config::describe(key)),
        )
    })
}

fn optional_string(group: &str, mapping: &Mapping, key: &str) -> Result<Option<String>> {
    match mapping.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::schema(
            group,
            "",
            format!("'{}' must be a string, got {}", key, config::describe(other)),
        )),
    }
}

fn string_list(group: &str, record: &str, key: &str, value: &Value) -> Result<Vec<String>> {
    serde_yaml::from_value(value.clone()).map_err(|_| {
        Error::schema(
            group,
            record,
            format!(
                "'{}' must be a list of strings, got {}",
                key,
                config::describe(value)
            ),
        )
    })
}
