//! In-memory locale tree, loadable from YAML.
//!
//! ```yaml
//! root:
//!   values:
//!     "//ldml/dates/calendars/calendar[@type=\"gregorian\"]/months/month[@type=\"1\"]": M01
//! fr:
//!   values:
//!     "//ldml/greeting": Bonjour
//! fr_CA:
//!   values:
//!     "//ldml/greeting": { value: Allô, draft: contributed }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use super::{ChangeListener, INHERITANCE_MARKER, LocaleId, LocaleSource};
use crate::error::LoadError;
use crate::xpath::XPath;

// Guards against parent cycles in hand-written data
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    full_path: XPath,
}

#[derive(Debug, Clone, Default)]
struct LocaleData {
    parent: Option<LocaleId>,
    values: BTreeMap<XPath, Entry>,
}

#[derive(Deserialize)]
struct LocaleDoc {
    parent: Option<String>,
    #[serde(default)]
    values: BTreeMap<String, EntryDoc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryDoc {
    Plain(String),
    Detailed {
        value: String,
        draft: Option<String>,
    },
}

#[derive(Default)]
pub struct MemoryLocaleTree {
    locales: RwLock<HashMap<LocaleId, LocaleData>>,
    listeners: RwLock<Vec<Weak<dyn ChangeListener>>>,
}

impl MemoryLocaleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, LoadError> {
        let docs: BTreeMap<String, LocaleDoc> = serde_yaml::from_str(content)?;
        let mut locales = HashMap::new();

        for (id, doc) in docs {
            let mut data = LocaleData {
                parent: doc.parent.map(LocaleId::from),
                values: BTreeMap::new(),
            };
            for (path, entry) in doc.values {
                let (value, draft) = match entry {
                    EntryDoc::Plain(value) => (value, None),
                    EntryDoc::Detailed { value, draft } => (value, draft),
                };
                let path = XPath::from(path);
                let full_path = full_path_for(&path, draft.as_deref())?;
                data.values.insert(path, Entry { value, full_path });
            }
            locales.insert(LocaleId::from(id), data);
        }

        Ok(Self {
            locales: RwLock::new(locales),
            listeners: RwLock::default(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read locale data: {path:?}"))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load locale data from {path:?}"))
    }

    /// Adds an empty locale. An explicit `parent` overrides truncation.
    pub fn insert_locale(&self, locale: impl Into<LocaleId>, parent: Option<LocaleId>) {
        let mut locales = self.locales.write();
        let data = locales.entry(locale.into()).or_default();
        data.parent = parent;
    }

    pub fn add_listener(&self, listener: Weak<dyn ChangeListener>) {
        self.listeners.write().push(listener);
    }

    pub fn set_value(
        &self,
        locale: &LocaleId,
        path: &XPath,
        value: impl Into<String>,
    ) -> Result<(), LoadError> {
        self.set_value_with_draft(locale, path, value, None)
    }

    pub fn set_value_with_draft(
        &self,
        locale: &LocaleId,
        path: &XPath,
        value: impl Into<String>,
        draft: Option<&str>,
    ) -> Result<(), LoadError> {
        let full_path = full_path_for(path, draft)?;
        {
            let mut locales = self.locales.write();
            let data = locales.entry(locale.clone()).or_default();
            data.values.insert(
                path.clone(),
                Entry {
                    value: value.into(),
                    full_path,
                },
            );
        }
        self.notify(locale, path);
        Ok(())
    }

    /// Returns true if a value was removed.
    pub fn remove_value(&self, locale: &LocaleId, path: &XPath) -> bool {
        let removed = self
            .locales
            .write()
            .get_mut(locale)
            .and_then(|data| data.values.remove(path))
            .is_some();
        if removed {
            self.notify(locale, path);
        }
        removed
    }

    pub fn locales(&self) -> Vec<LocaleId> {
        let mut ids: Vec<_> = self.locales.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Paths authored in `locale` itself.
    pub fn paths(&self, locale: &LocaleId) -> Vec<XPath> {
        self.locales
            .read()
            .get(locale)
            .map(|data| data.values.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn notify(&self, locale: &LocaleId, path: &XPath) {
        let listeners: Vec<Arc<dyn ChangeListener>> = {
            let mut listeners = self.listeners.write();
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        debug!(
            "Value changed at {} in {}; notifying {} listener(s)",
            path,
            locale,
            listeners.len()
        );
        for listener in listeners {
            listener.value_changed(locale, path);
        }
    }

    fn parent_of(locales: &HashMap<LocaleId, LocaleData>, locale: &LocaleId) -> Option<LocaleId> {
        locales
            .get(locale)
            .and_then(|data| data.parent.clone())
            .or_else(|| locale.truncation_parent())
    }

    /// Walks the inheritance chain from `locale` up to root.
    fn find_entry<T>(
        &self,
        locale: &LocaleId,
        path: &XPath,
        f: impl Fn(&Entry) -> T,
    ) -> Option<T> {
        let locales = self.locales.read();
        let mut current = Some(locale.clone());
        let mut seen = HashSet::new();

        while let Some(id) = current {
            if seen.len() >= MAX_DEPTH || !seen.insert(id.clone()) {
                break;
            }
            if let Some(entry) = locales.get(&id).and_then(|data| data.values.get(path))
                && entry.value != INHERITANCE_MARKER
            {
                return Some(f(entry));
            }
            current = Self::parent_of(&locales, &id);
        }
        None
    }
}

impl LocaleSource for MemoryLocaleTree {
    fn contains(&self, locale: &LocaleId) -> bool {
        self.locales.read().contains_key(locale)
    }

    fn parent(&self, locale: &LocaleId) -> Option<LocaleId> {
        Self::parent_of(&self.locales.read(), locale)
    }

    fn children(&self, locale: &LocaleId) -> Vec<LocaleId> {
        let locales = self.locales.read();
        let mut children: Vec<LocaleId> = locales
            .keys()
            .filter(|&id| id != locale && Self::parent_of(&locales, id).as_ref() == Some(locale))
            .cloned()
            .collect();
        children.sort();
        children
    }

    fn resolved_value(&self, locale: &LocaleId, path: &XPath) -> Option<String> {
        self.find_entry(locale, path, |entry| entry.value.clone())
    }

    /// An authored inheritance marker does not count as present.
    fn is_here(&self, locale: &LocaleId, path: &XPath) -> bool {
        self.locales
            .read()
            .get(locale)
            .and_then(|data| data.values.get(path))
            .is_some_and(|entry| entry.value != INHERITANCE_MARKER)
    }

    fn full_path(&self, locale: &LocaleId, path: &XPath) -> XPath {
        self.find_entry(locale, path, |entry| entry.full_path.clone())
            .unwrap_or_else(|| path.clone())
    }
}

fn full_path_for(path: &XPath, draft: Option<&str>) -> Result<XPath, LoadError> {
    match draft {
        None => Ok(path.clone()),
        Some(draft) => {
            let mut parts = path.parts()?;
            if let Some(last) = parts.elements.last_mut() {
                last.set_attribute("draft", draft);
            }
            Ok(parts.to_xpath())
        }
    }
}
