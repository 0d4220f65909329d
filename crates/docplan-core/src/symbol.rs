use std::fmt;

use serde::{Deserialize, Serialize};

/// Dot-separated identifier of a callable within a root namespace,
/// e.g. `root.sub.Class.method`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolPath(String);

impl SymbolPath {
    /// Path consisting of a single root segment.
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Append a member name, producing `self + "." + name`.
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    /// The last segment (the member's short name).
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Iterate over the individual segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of segments in the path.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// True when `self` lies strictly below `ancestor` (`ancestor.` prefix).
    pub fn is_nested_under(&self, ancestor: &str) -> bool {
        self.0.len() > ancestor.len()
            && self.0.starts_with(ancestor)
            && self.0.as_bytes()[ancestor.len()] == b'.'
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolPath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SymbolPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SymbolPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
