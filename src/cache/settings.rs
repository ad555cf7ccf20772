//! Cache settings, loadable from YAML.
//!
//! ```yaml
//! capacity: 16
//! check_filter: "children|root"
//! exclusions:
//!   - locale: "^en"
//!     subtype: valueMatchesRoot
//!     path: "exemplarCity"
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::locale::LocaleId;
use crate::status::{CheckStatus, Subtype};
use crate::xpath::XPath;

pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Most distinct locales held at once.
    pub capacity: NonZeroUsize,
    /// Case-insensitive regex over check names; only matching checks run.
    pub check_filter: Option<String>,
    pub exclusions: Vec<ExclusionFilter>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            check_filter: None,
            exclusions: Vec::new(),
        }
    }
}

impl CacheSettings {
    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_check_filter(mut self, filter: impl Into<String>) -> Self {
        self.check_filter = Some(filter.into());
        self
    }

    pub fn with_exclusion(mut self, exclusion: ExclusionFilter) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache settings: {path:?}"))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse cache settings from {path:?}"))
    }
}

/// Drops diagnostics of one subtype on matching locales and paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ExclusionDoc", into = "ExclusionDoc")]
pub struct ExclusionFilter {
    locale: Regex,
    subtype: Subtype,
    path: Regex,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExclusionDoc {
    #[serde(default = "match_all")]
    locale: String,
    subtype: Subtype,
    #[serde(default = "match_all")]
    path: String,
}

fn match_all() -> String {
    ".*".to_string()
}

impl ExclusionFilter {
    pub fn new(locale: &str, subtype: Subtype, path: &str) -> Result<Self, LoadError> {
        Ok(Self {
            locale: compile("locale", locale)?,
            subtype,
            path: compile("path", path)?,
        })
    }

    pub fn subtype(&self) -> Subtype {
        self.subtype
    }

    pub fn applies_to(&self, locale: &LocaleId) -> bool {
        self.locale.is_match(locale.as_str())
    }

    pub fn excludes(&self, path: &XPath, status: &CheckStatus) -> bool {
        status.subtype == self.subtype && self.path.is_match(path.as_str())
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, LoadError> {
    Regex::new(pattern).map_err(|source| LoadError::Regex {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

impl TryFrom<ExclusionDoc> for ExclusionFilter {
    type Error = LoadError;

    fn try_from(doc: ExclusionDoc) -> Result<Self, LoadError> {
        Self::new(&doc.locale, doc.subtype, &doc.path)
    }
}

impl From<ExclusionFilter> for ExclusionDoc {
    fn from(filter: ExclusionFilter) -> Self {
        Self {
            locale: filter.locale.as_str().to_string(),
            subtype: filter.subtype,
            path: filter.path.as_str().to_string(),
        }
    }
}
