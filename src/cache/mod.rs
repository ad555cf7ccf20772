//! Memoized check results per locale and option set.
//!
//! Entries are grouped by locale. The cache holds at most `capacity` locales;
//! adding one more evicts the least recently used locale with every option set
//! built for it. A data change evicts the changed locale and all of its
//! descendants, since any of their resolved values may now differ.

mod bundle;
mod settings;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::checks::CheckChain;
use crate::error::LoadError;
use crate::locale::{ChangeListener, LocaleId, LocaleSource, descendants};
use crate::options::CheckOptions;
use crate::xpath::XPath;

pub use bundle::ResultBundle;
pub use settings::{CacheSettings, DEFAULT_CAPACITY, ExclusionFilter};

/// Filled exactly once; every caller that finds the slot waits on the same build.
type Slot = Arc<OnceCell<Arc<ResultBundle>>>;

/// Bundles for one locale, keyed by [`CheckOptions::cache_key`].
type LocaleEntries = HashMap<String, Slot>;

pub struct ResultCache {
    source: Arc<dyn LocaleSource>,
    chain: CheckChain,
    exclusions: Vec<ExclusionFilter>,
    entries: Mutex<LruCache<LocaleId, LocaleEntries>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub locales: usize,
    pub bundles: usize,
    pub hits: u64,
    pub misses: u64,
    /// Locales dropped, by capacity or by change notification.
    pub evictions: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} locale(s), {} bundle(s), {} hit(s), {} miss(es), {} eviction(s)",
            self.locales, self.bundles, self.hits, self.misses, self.evictions
        )
    }
}

impl ResultCache {
    pub fn new(source: Arc<dyn LocaleSource>, chain: CheckChain) -> Self {
        Self::with_capacity(source, chain, CacheSettings::default().capacity)
    }

    pub fn with_capacity(
        source: Arc<dyn LocaleSource>,
        chain: CheckChain,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            source,
            chain,
            exclusions: Vec::new(),
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Applies `settings` on top of `chain`. Fails only on a bad filter regex.
    pub fn with_settings(
        source: Arc<dyn LocaleSource>,
        chain: CheckChain,
        settings: &CacheSettings,
    ) -> Result<Self, LoadError> {
        let chain = match &settings.check_filter {
            Some(filter) => chain.with_filter(filter)?,
            None => chain,
        };
        let mut cache = Self::with_capacity(source, chain, settings.capacity);
        cache.exclusions = settings.exclusions.clone();
        Ok(cache)
    }

    pub fn source(&self) -> &Arc<dyn LocaleSource> {
        &self.source
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().cap()
    }

    /// Returns the bundle for (`locale`, `options`), building it on a miss.
    ///
    /// Concurrent misses on the same key share one build. The lock is not held
    /// while building.
    pub fn get_bundle(&self, locale: &LocaleId, options: &CheckOptions) -> Arc<ResultBundle> {
        let key = options.cache_key();
        let slot = {
            let mut entries = self.entries.lock();
            if entries.get(locale).is_none()
                && let Some((evicted, bundles)) = entries.push(locale.clone(), HashMap::new())
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Evicted least recently used locale {evicted} ({} bundle(s))",
                    bundles.len()
                );
            }
            match entries.get_mut(locale) {
                Some(bundles) => Arc::clone(bundles.entry(key).or_default()),
                // Unreachable with a non-zero capacity; build without caching
                None => Arc::default(),
            }
        };

        if let Some(bundle) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {locale} {options}");
            return Arc::clone(bundle);
        }

        let bundle = slot.get_or_init(|| {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss for {locale} {options}; building");
            Arc::new(ResultBundle::build(
                locale,
                Arc::clone(&self.source),
                &self.chain,
                options,
                &self.exclusions,
            ))
        });
        Arc::clone(bundle)
    }

    /// Drops every bundle for `locale` and for each locale below it.
    ///
    /// `path` is accepted for finer invalidation later; today the whole locale
    /// goes.
    pub fn notify_change(&self, locale: &LocaleId, path: &XPath) {
        let mut stale = descendants(self.source.as_ref(), locale);
        stale.insert(locale.clone());

        let mut entries = self.entries.lock();
        let mut evicted = 0;
        for id in &stale {
            if entries.pop(id).is_some() {
                evicted += 1;
            }
        }
        drop(entries);

        self.evictions.fetch_add(evicted, Ordering::Relaxed);
        debug!(
            "Change at {locale} {path}: evicted {evicted} of {} affected locale(s)",
            stale.len()
        );
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len() as u64;
        entries.clear();
        drop(entries);
        self.evictions.fetch_add(count, Ordering::Relaxed);
        debug!("Cleared {count} locale(s) from the result cache");
    }

    /// True if any bundle for `locale` is held, without touching recency.
    pub fn contains(&self, locale: &LocaleId) -> bool {
        self.entries.lock().contains(locale)
    }

    /// Locales currently held, most recently used first.
    pub fn locales(&self) -> Vec<LocaleId> {
        self.entries.lock().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            locales: entries.len(),
            bundles: entries
                .iter()
                .map(|(_, bundles)| bundles.values().filter(|s| s.get().is_some()).count())
                .sum(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl ChangeListener for ResultCache {
    fn value_changed(&self, locale: &LocaleId, path: &XPath) {
        self.notify_change(locale, path);
    }
}
