use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::checks::{CheckChain, ConfiguredChain};
use crate::cache::ExclusionFilter;
use crate::locale::{LocaleId, LocaleSource};
use crate::options::CheckOptions;
use crate::status::CheckStatus;
use crate::xpath::XPath;

/// A check chain configured for one locale and one option set.
///
/// Built in full before it is published to the cache and never mutated after.
pub struct ResultBundle {
    source: Arc<dyn LocaleSource>,
    chain: ConfiguredChain,
    setup_time: Duration,
}

impl ResultBundle {
    pub fn build(
        locale: &LocaleId,
        source: Arc<dyn LocaleSource>,
        chain: &CheckChain,
        options: &CheckOptions,
        exclusions: &[ExclusionFilter],
    ) -> Self {
        let started = Instant::now();
        let chain = chain.configure(locale, Arc::clone(&source), options, exclusions);
        Self {
            source,
            chain,
            setup_time: started.elapsed(),
        }
    }

    pub fn locale(&self) -> &LocaleId {
        self.chain.locale()
    }

    pub fn options(&self) -> &CheckOptions {
        self.chain.options()
    }

    /// Problems found while configuring, each flagged `entire_locale`.
    pub fn possible_problems(&self) -> &[CheckStatus] {
        self.chain.possible_problems()
    }

    pub fn setup_time(&self) -> Duration {
        self.setup_time
    }

    /// Checks one data point, looking up its full path in the locale source.
    pub fn check(&self, path: &XPath, value: &str) -> Vec<CheckStatus> {
        let full_path = self.source.full_path(self.locale(), path);
        self.chain.check(path, &full_path, value)
    }

    pub fn check_with_full_path(
        &self,
        path: &XPath,
        full_path: &XPath,
        value: &str,
    ) -> Vec<CheckStatus> {
        self.chain.check(path, full_path, value)
    }

    /// Checks the value the locale currently resolves to at `path`. Nothing to
    /// check means no diagnostics.
    pub fn check_resolved(&self, path: &XPath) -> Vec<CheckStatus> {
        match self.source.resolved_value(self.locale(), path) {
            Some(value) => self.check(path, &value),
            None => Vec::new(),
        }
    }

    pub fn get_examples(&self, path: &XPath, value: &str) -> Vec<CheckStatus> {
        let full_path = self.source.full_path(self.locale(), path);
        self.chain.get_examples(path, &full_path, value)
    }
}

impl std::fmt::Debug for ResultBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultBundle")
            .field("locale", self.locale())
            .field("options", self.options())
            .field("checks", &self.chain.member_ids())
            .field("possible_problems", &self.possible_problems().len())
            .finish()
    }
}
