//! Provides dotted-path resolution against records.

use serde_json::Value;
use std::cmp::Ordering;

/// A dotted path (`"value.title"`) compiled once into its segments, so a
/// query never re-splits the same string on every record it scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledPath {
    raw: String,
    segments: Vec<String>,
}

impl CompiledPath {
    pub fn compile(path: impl AsRef<str>) -> Self {
        let raw = path.as_ref().to_string();
        let segments = raw.split('.').map(str::to_string).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walks `record` one segment at a time. Returns `None` (the absent
    /// sentinel) as soon as an intermediate value is missing or
    /// non-traversable.
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.segments {
            current = current.as_object().and_then(|obj| obj.get(segment))?;
        }
        Some(current)
    }
}

impl From<&str> for CompiledPath {
    fn from(path: &str) -> Self {
        Self::compile(path)
    }
}

impl From<String> for CompiledPath {
    fn from(path: String) -> Self {
        Self::compile(path)
    }
}

/// The "natural ordering" used by `$orderBy`: numbers compared numerically,
/// strings compared lexicographically, absent values sort last, anything
/// else falls back to the key comparator's type-rank so the comparator
/// never panics on heterogeneous values.
pub fn natural_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => match (a.as_str(), b.as_str()) {
                (Some(x), Some(y)) => x.cmp(y),
                _ => crate::key::Key(a.clone()).cmp(&crate::key::Key(b.clone())),
            },
        },
    }
}
