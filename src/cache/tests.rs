use std::sync::atomic::AtomicUsize;
use std::sync::{Barrier, Weak};
use std::time::Duration;

use super::*;
use crate::checks::{Check, CheckInput, Configured, standard_checks};
use crate::error::LocaleChecksError;
use crate::locale::memory::MemoryLocaleTree;
use crate::options::{OptionKey, Phase};
use crate::status::{CheckId, CheckStatus, Subtype};

const TREE: &str = r#"
root:
  values:
    "//ldml/greeting": Hello
fr:
  values:
    "//ldml/greeting": Bonjour
fr_CA:
  values:
    "//ldml/greeting": { value: Allô, draft: contributed }
fr_CH: {}
fr_CH_x: {}
de:
  values:
    "//ldml/greeting": Hallo
"#;

fn tree() -> Arc<MemoryLocaleTree> {
    Arc::new(MemoryLocaleTree::from_yaml_str(TREE).unwrap())
}

fn cache_with_capacity(capacity: usize) -> ResultCache {
    ResultCache::with_capacity(
        tree(),
        standard_checks(),
        NonZeroUsize::new(capacity).unwrap(),
    )
}

fn id(locale: &str) -> LocaleId {
    LocaleId::from(locale)
}

#[test]
fn test_hit_returns_same_bundle() {
    let cache = ResultCache::new(tree(), standard_checks());
    let options = CheckOptions::new();

    let first = cache.get_bundle(&id("fr"), &options);
    let second = cache.get_bundle(&id("fr"), &options);
    assert!(Arc::ptr_eq(&first, &second));

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.locales, 1);
    assert_eq!(stats.bundles, 1);
}

#[test]
fn test_options_identity_is_by_content() {
    let cache = ResultCache::new(tree(), standard_checks());
    let a = CheckOptions::for_phase(Phase::Vetting).with(OptionKey::ShowTimes, "true");
    let b = CheckOptions::from_pairs([("SHOW_TIMES", "true"), ("phase", "vetting")]).unwrap();
    let c = CheckOptions::for_phase(Phase::FinalTesting);

    let bundle_a = cache.get_bundle(&id("fr"), &a);
    let bundle_b = cache.get_bundle(&id("fr"), &b);
    let bundle_c = cache.get_bundle(&id("fr"), &c);

    assert!(Arc::ptr_eq(&bundle_a, &bundle_b));
    assert!(!Arc::ptr_eq(&bundle_a, &bundle_c));
    assert_eq!(bundle_c.options().phase(), Phase::FinalTesting);

    let stats = cache.stats();
    assert_eq!(stats.locales, 1);
    assert_eq!(stats.bundles, 2);
}

#[test]
fn test_notify_change_evicts_descendants_only() {
    let cache = ResultCache::new(tree(), standard_checks());
    let options = CheckOptions::new();
    let all = ["root", "fr", "fr_CA", "fr_CH", "fr_CH_x", "de"];
    let before: Vec<_> = all
        .iter()
        .map(|l| cache.get_bundle(&id(l), &options))
        .collect();

    cache.notify_change(&id("fr"), &XPath::from("//ldml/greeting"));

    for locale in ["fr", "fr_CA", "fr_CH", "fr_CH_x"] {
        assert!(!cache.contains(&id(locale)), "{locale} should be evicted");
    }
    for locale in ["root", "de"] {
        assert!(cache.contains(&id(locale)), "{locale} should be kept");
    }
    assert_eq!(cache.stats().evictions, 4);

    // Later requests never see a bundle from before the change
    for (locale, old) in all.iter().zip(&before) {
        let new = cache.get_bundle(&id(locale), &options);
        let kept = locale == &"root" || locale == &"de";
        assert_eq!(Arc::ptr_eq(old, &new), kept, "{locale}");
    }
}

#[test]
fn test_notify_change_at_root_evicts_everything() {
    let cache = ResultCache::new(tree(), standard_checks());
    let options = CheckOptions::new();
    for locale in ["fr_CA", "de", "root"] {
        cache.get_bundle(&id(locale), &options);
    }

    cache.notify_change(&LocaleId::root(), &XPath::from("//ldml/greeting"));
    assert_eq!(cache.stats().locales, 0);
}

#[test]
fn test_capacity_evicts_least_recently_used_locale() {
    let cache = cache_with_capacity(2);
    let submission = CheckOptions::new();
    let final_testing = CheckOptions::for_phase(Phase::FinalTesting);

    cache.get_bundle(&id("fr"), &submission);
    cache.get_bundle(&id("fr"), &final_testing);
    cache.get_bundle(&id("de"), &submission);
    // Touch fr so de becomes the oldest
    cache.get_bundle(&id("fr"), &submission);
    cache.get_bundle(&id("fr_CA"), &submission);

    assert_eq!(cache.locales(), vec![id("fr_CA"), id("fr")]);
    assert_eq!(cache.stats().bundles, 3);

    cache.get_bundle(&id("root"), &submission);
    // fr goes with both of its option sets
    assert_eq!(cache.locales(), vec![id("root"), id("fr_CA")]);
    let stats = cache.stats();
    assert_eq!(stats.bundles, 2);
    assert_eq!(stats.evictions, 2);
}

struct CountingCheck {
    configured: Arc<AtomicUsize>,
}

impl Check for CountingCheck {
    type Context = ();

    fn id(&self) -> CheckId {
        CheckId::Children
    }

    fn configure(
        &self,
        _locale: &LocaleId,
        _source: &Arc<dyn LocaleSource>,
        _options: &CheckOptions,
    ) -> Result<Configured<()>, LocaleChecksError> {
        self.configured.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        Ok(Configured::new(()))
    }

    fn check(
        &self,
        _context: &(),
        _input: &CheckInput<'_>,
        _options: &CheckOptions,
        _prior: &[CheckStatus],
    ) -> Vec<CheckStatus> {
        Vec::new()
    }
}

#[test]
fn test_concurrent_misses_share_one_build() {
    let configured = Arc::new(AtomicUsize::new(0));
    let chain = CheckChain::new().add(CountingCheck {
        configured: Arc::clone(&configured),
    });
    let cache = ResultCache::new(tree(), chain);
    let options = CheckOptions::new();
    let barrier = Barrier::new(8);

    let bundles: Vec<Arc<ResultBundle>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_bundle(&id("fr"), &options)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(configured.load(Ordering::SeqCst), 1);
    assert!(bundles.iter().all(|b| Arc::ptr_eq(b, &bundles[0])));
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_registered_listener_sees_mutations() {
    let tree = tree();
    let cache = Arc::new(ResultCache::new(tree.clone(), standard_checks()));
    let listener: Weak<dyn ChangeListener> = Arc::downgrade(&cache) as Weak<dyn ChangeListener>;
    tree.add_listener(listener);

    let options = CheckOptions::new();
    let path = XPath::from("//ldml/greeting");
    let before = cache.get_bundle(&id("fr"), &options);
    assert!(before.check(&path, "Bonjour").is_empty());

    // A change below fr leaves fr alone
    tree.set_value(&id("fr_CA"), &path, "Bonjour").unwrap();
    assert!(cache.contains(&id("fr")));
    assert!(!cache.contains(&id("fr_CA")));

    tree.set_value(&id("fr"), &path, "Salut").unwrap();
    assert!(!cache.contains(&id("fr")));
    let after = cache.get_bundle(&id("fr"), &options);
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.check(&path, "Salut").is_empty());
}

#[test]
fn test_clear() {
    let cache = ResultCache::new(tree(), standard_checks());
    cache.get_bundle(&id("fr"), &CheckOptions::new());
    cache.get_bundle(&id("de"), &CheckOptions::new());

    cache.clear();
    let stats = cache.stats();
    assert_eq!(stats.locales, 0);
    assert_eq!(stats.evictions, 2);
    assert_eq!(
        stats.to_string(),
        "0 locale(s), 0 bundle(s), 0 hit(s), 2 miss(es), 2 eviction(s)"
    );
}

#[test]
fn test_bundle_checks_use_source_full_path() {
    let cache = ResultCache::new(tree(), standard_checks());
    let bundle = cache.get_bundle(&id("fr_CA"), &CheckOptions::new());
    assert_eq!(bundle.locale(), &id("fr_CA"));
    assert!(bundle.possible_problems().is_empty());

    let path = XPath::from("//ldml/greeting");
    assert!(bundle.check_resolved(&path).is_empty());
    assert!(bundle.check_resolved(&XPath::from("//ldml/missing")).is_empty());

    // Regional value equal to root
    let found = bundle.check(&path, "Hello");
    assert_eq!(found[0].subtype, Subtype::ValueMatchesRoot);
}

#[test]
fn test_bundle_for_unknown_locale() {
    let cache = ResultCache::new(tree(), standard_checks());
    let bundle = cache.get_bundle(&id("xx"), &CheckOptions::new());
    assert_eq!(bundle.possible_problems().len(), 1);
    assert_eq!(
        bundle.possible_problems()[0].subtype,
        Subtype::CouldNotResolveLocale
    );
    assert!(bundle.check(&XPath::from("//ldml/greeting"), "x").is_empty());
}

#[test]
fn test_settings_from_yaml() {
    let settings = CacheSettings::from_yaml_str(
        r#"
capacity: 4
check_filter: children
exclusions:
  - locale: "^fr$"
    subtype: valueAlwaysOverridden
"#,
    )
    .unwrap();
    assert_eq!(settings.capacity.get(), 4);
    assert_eq!(settings.exclusions.len(), 1);
    assert_eq!(
        settings.exclusions[0].subtype(),
        Subtype::ValueAlwaysOverridden
    );

    let cache = ResultCache::with_settings(tree(), standard_checks(), &settings).unwrap();
    assert_eq!(cache.capacity().get(), 4);
    let path = XPath::from("//ldml/greeting");
    let fr = cache.get_bundle(&id("fr"), &CheckOptions::new());
    assert!(fr.check(&path, "Bonsoir").is_empty());
    // Only the children check runs, so the regional root match goes unreported
    assert!(
        cache
            .get_bundle(&id("fr_CA"), &CheckOptions::new())
            .check(&path, "Hello")
            .is_empty()
    );
}

#[test]
fn test_settings_defaults_and_errors() {
    let settings = CacheSettings::from_yaml_str("{}").unwrap();
    assert_eq!(settings.capacity.get(), DEFAULT_CAPACITY);
    assert!(settings.check_filter.is_none());

    assert!(CacheSettings::from_yaml_str("capacity: 0").is_err());
    assert!(CacheSettings::from_yaml_str("capcity: 3").is_err());
    assert!(
        CacheSettings::from_yaml_str(
            "exclusions:\n  - subtype: valueMatchesRoot\n    path: \"[\"\n"
        )
        .is_err()
    );

    let bad_filter = CacheSettings::default().with_check_filter("(");
    assert!(matches!(
        ResultCache::with_settings(tree(), standard_checks(), &bad_filter),
        Err(LoadError::Regex { field: "check_filter", .. })
    ));
}

#[test]
fn test_settings_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.yml");
    std::fs::write(&path, "capacity: 2\n").unwrap();

    let settings = CacheSettings::from_path(&path).unwrap();
    assert_eq!(settings.capacity.get(), 2);

    let missing = CacheSettings::from_path(&dir.path().join("missing.yml"));
    assert!(missing.unwrap_err().to_string().contains("missing.yml"));
}
