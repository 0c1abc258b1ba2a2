//! Job template rendering.
//!
//! A template is Jenkins `config.xml` text with `{{KEY}}` placeholders.
//! Rendering replaces each placeholder with its XML-escaped binding; a
//! placeholder without a binding is an error rather than an empty string,
//! so a job is never created with a silently missing parameter.
//!
//! The built-in templates are compiled into the binary. A directory of
//! overrides may replace any of them by file name (`<name>.xml`).

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Package build from the stable packaging branch.
pub const PACKAGE_STABLE: &str = "package-stable";
/// Package build from the unstable packaging branch.
pub const PACKAGE_UNSTABLE: &str = "package-unstable";
/// Branch cascade job.
pub const MERGER: &str = "merger";
/// Placeholder for cascades that cannot push.
pub const NOOP: &str = "noop";
/// Release management aggregation job.
pub const RELEASE_MGMT: &str = "release-mgmt";

const BUILTIN: &[(&str, &str)] = &[
    (PACKAGE_STABLE, include_str!("../templates/package-stable.xml")),
    (PACKAGE_UNSTABLE, include_str!("../templates/package-unstable.xml")),
    (MERGER, include_str!("../templates/merger.xml")),
    (NOOP, include_str!("../templates/noop.xml")),
    (RELEASE_MGMT, include_str!("../templates/release-mgmt.xml")),
];

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Z][A-Z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Named parameter values for one rendering.
pub type Bindings = BTreeMap<&'static str, String>;

/// The set of templates available to the job builder.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<String, String>,
}

impl TemplateSet {
    /// The templates shipped with the binary.
    pub fn builtin() -> Self {
        let templates = BUILTIN
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect();
        Self { templates }
    }

    /// The built-in templates, with any `<name>.xml` found in `dir`
    /// replacing its built-in counterpart.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        for (name, _) in BUILTIN {
            let path = dir.join(format!("{}.xml", name));
            if path.is_file() {
                log::debug!("Using template override {}", path.display());
                set.insert(name, std::fs::read_to_string(&path)?);
            }
        }
        Ok(set)
    }

    /// Adds or replaces a template.
    pub fn insert(&mut self, name: &str, text: impl Into<String>) {
        self.templates.insert(name.to_string(), text.into());
    }

    /// Renders the template `name` with `bindings`.
    pub fn render(&self, name: &str, bindings: &Bindings) -> Result<String> {
        let template = self.templates.get(name).ok_or_else(|| Error::Template {
            message: format!("unknown template '{}'", name),
            variable: None,
        })?;

        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(template) {
            let whole = captures.get(0).expect("group 0 always matches");
            let key = &captures[1];
            let value = bindings.get(key).ok_or_else(|| Error::Template {
                message: format!("template '{}' has no binding for a placeholder", name),
                variable: Some(key.to_string()),
            })?;
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&escape_xml(value));
            last = whole.end();
        }
        rendered.push_str(&template[last..]);
        Ok(rendered)
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
