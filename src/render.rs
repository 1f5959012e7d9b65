//! Render strategies that turn a manifest into an HTML fragment
//!
//! The default strategy, [`ScriptTags`], emits one
//! `<script src="URL" async></script>` line per manifest entry. Callers can
//! supply any [`RenderScript`] instead, including a plain closure.

use std::fmt;

use crate::manifest::Manifest;

/// Marker used by [`inject_scripts`] when no position is given
pub const DEFAULT_INJECT_POSITION: &str = "</head>";

/// A string that is already valid HTML and must not be escaped again
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Marks `html` as pre-escaped
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SafeHtml> for String {
    fn from(html: SafeHtml) -> Self {
        html.0
    }
}

impl From<SafeHtml> for minijinja::Value {
    fn from(html: SafeHtml) -> Self {
        minijinja::Value::from_safe_string(html.0)
    }
}

/// Turns a manifest into an HTML fragment
pub trait RenderScript: Send + Sync {
    fn render_script(&self, manifest: &Manifest) -> String;
}

impl<F> RenderScript for F
where
    F: Fn(&Manifest) -> String + Send + Sync,
{
    fn render_script(&self, manifest: &Manifest) -> String {
        self(manifest)
    }
}

/// A single attribute on a generated `<script>` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAttribute {
    /// Boolean attribute rendered as a bare name, e.g. `async`
    Flag(String),
    /// Attribute rendered as `name="value"`
    Value(String, String),
}

impl ScriptAttribute {
    pub fn flag(name: impl Into<String>) -> Self {
        Self::Flag(name.into())
    }

    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Value(name.into(), value.into())
    }

    /// Parses `name` or `name=value`
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, value) = match raw.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (raw.trim(), None),
        };
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
        if !valid_name {
            return None;
        }
        Some(match value {
            Some(value) => Self::value(name, value),
            None => Self::flag(name),
        })
    }
}

impl fmt::Display for ScriptAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(name) => f.write_str(name),
            Self::Value(name, value) => write!(f, "{}=\"{}\"", name, value.replace('"', "&quot;")),
        }
    }
}

/// Default render strategy: one `<script>` tag per manifest entry
///
/// URLs are substituted into `src` verbatim, without escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTags {
    attributes: Vec<ScriptAttribute>,
}

impl ScriptTags {
    /// Tags carrying only the `async` attribute
    pub fn new() -> Self {
        Self::with_attributes(vec![ScriptAttribute::flag("async")])
    }

    /// Tags carrying exactly `attributes`, in order, after `src`
    pub fn with_attributes(attributes: Vec<ScriptAttribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[ScriptAttribute] {
        &self.attributes
    }

    fn tag(&self, src: &str) -> String {
        let mut tag = format!("<script src=\"{src}\"");
        for attribute in &self.attributes {
            tag.push(' ');
            tag.push_str(&attribute.to_string());
        }
        tag.push_str("></script>");
        tag
    }
}

impl Default for ScriptTags {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScript for ScriptTags {
    fn render_script(&self, manifest: &Manifest) -> String {
        manifest
            .js
            .iter()
            .map(|src| self.tag(src))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Inserts `fragment` and a newline just before the first `position` in `html`
///
/// The document is returned unchanged when the fragment is empty or the
/// marker does not occur.
pub fn inject_scripts(html: &str, fragment: &SafeHtml, position: &str) -> String {
    if fragment.is_empty() || position.is_empty() {
        return html.to_string();
    }
    match html.find(position) {
        Some(at) => format!("{}{}\n{}", &html[..at], fragment, &html[at..]),
        None => html.to_string(),
    }
}
