//! Locale identifiers and the locale data collaborator.

pub mod memory;


use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::xpath::XPath;

/// Value meaning "use whatever the parent locale has here".
pub const INHERITANCE_MARKER: &str = "↑↑↑";

const ROOT: &str = "root";

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleId(Arc<str>);

impl LocaleId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn root() -> Self {
        Self::new(ROOT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        &*self.0 == ROOT
    }

    /// The language subtag: `fr` for `fr_CA`.
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }

    pub fn has_subtags(&self) -> bool {
        !self.is_root() && self.0.contains('_')
    }

    /// Parent by removing the last subtag; base locales fall back to root.
    pub fn truncation_parent(&self) -> Option<LocaleId> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('_') {
            Some(i) => Some(Self::new(&self.0[..i])),
            None => Some(Self::root()),
        }
    }

    /// True if `self` is `parent` plus exactly one more subtag.
    pub fn is_immediate_child_of(&self, parent: &LocaleId) -> bool {
        self.0
            .strip_prefix(parent.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|suffix| !suffix.is_empty() && !suffix.contains('_'))
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocaleId({})", self.0)
    }
}

impl From<&str> for LocaleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LocaleId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Access to locale data with inheritance already applied. Loading the data and
/// resolving inheritance are the implementor's business.
pub trait LocaleSource: Send + Sync {
    fn contains(&self, locale: &LocaleId) -> bool;

    fn parent(&self, locale: &LocaleId) -> Option<LocaleId>;

    /// Immediate children in sorted order.
    fn children(&self, locale: &LocaleId) -> Vec<LocaleId>;

    /// The value a consumer sees at `path` after inheritance.
    fn resolved_value(&self, locale: &LocaleId, path: &XPath) -> Option<String>;

    /// True if the value at `path` is authored in `locale` itself.
    fn is_here(&self, locale: &LocaleId, path: &XPath) -> bool;

    /// The path with all of its attributes, including `draft`.
    fn full_path(&self, _locale: &LocaleId, path: &XPath) -> XPath {
        path.clone()
    }

    /// What `locale` would show at `path` if it had no value of its own.
    fn inherited_value(&self, locale: &LocaleId, path: &XPath) -> Option<String> {
        self.parent(locale)
            .and_then(|parent| self.resolved_value(&parent, path))
    }
}

/// Receives notice of every data mutation.
pub trait ChangeListener: Send + Sync {
    fn value_changed(&self, locale: &LocaleId, path: &XPath);
}

/// Every locale reachable from `locale` through the child relation, excluding
/// `locale` itself.
pub fn descendants(source: &dyn LocaleSource, locale: &LocaleId) -> BTreeSet<LocaleId> {
    let mut found = BTreeSet::new();
    let mut pending = source.children(locale);
    while let Some(next) = pending.pop() {
        if &next == locale || !found.insert(next.clone()) {
            continue;
        }
        pending.extend(source.children(&next));
    }
    found
}
