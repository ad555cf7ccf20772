use std::sync::Arc;
use std::time::Instant;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info, warn};

use super::{CheckInput, ConfiguredCheck, DynCheck};
use crate::cache::ExclusionFilter;
use crate::error::{LoadError, LocaleChecksError};
use crate::locale::{INHERITANCE_MARKER, LocaleId, LocaleSource};
use crate::options::{CheckOptions, OptionKey, Phase};
use crate::status::{CheckId, CheckStatus, Message, Subtype};
use crate::xpath::XPath;

/// Several checks behind one contract. Members run in registration order.
#[derive(Clone, Default)]
pub struct CheckChain {
    members: Vec<Arc<dyn DynCheck>>,
    filter: Option<Regex>,
}

impl CheckChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<C: super::Check>(mut self, check: C) -> Self {
        self.members.push(Arc::new(check));
        self
    }

    /// Keeps only the checks whose name matches `pattern`, ignoring case.
    pub fn with_filter(self, pattern: &str) -> Result<Self, LoadError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| LoadError::Regex {
                field: "check_filter",
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(self.with_filter_regex(regex))
    }

    pub fn with_filter_regex(mut self, filter: Regex) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.active().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the checks that pass the filter.
    pub fn names(&self) -> Vec<&'static str> {
        self.active().map(|m| m.id().name()).collect()
    }

    fn active(&self) -> impl Iterator<Item = &Arc<dyn DynCheck>> {
        self.members.iter().filter(|m| match &self.filter {
            Some(filter) => filter.is_match(m.id().name()),
            None => true,
        })
    }

    /// Configures every member against `locale`. A member that fails is
    /// reported and left out; the rest carry on.
    pub fn configure(
        &self,
        locale: &LocaleId,
        source: Arc<dyn LocaleSource>,
        options: &CheckOptions,
        exclusions: &[ExclusionFilter],
    ) -> ConfiguredChain {
        let show_times = options.flag(OptionKey::ShowTimes);
        let overall = Instant::now();
        let mut members = Vec::new();
        let mut possible_problems = Vec::new();

        if !source.contains(locale) {
            warn!("No data for locale {locale}; all checks disabled");
            possible_problems.push(
                CheckStatus::error(
                    Subtype::CouldNotResolveLocale,
                    CheckId::Chain,
                    Message::new("Could not load data for locale {0}").arg(locale),
                )
                .for_entire_locale(),
            );
        } else {
            for member in self.active() {
                let started = Instant::now();
                match Arc::clone(member).configure_dyn(locale, &source, options) {
                    Ok((configured, statuses)) => {
                        members.push(configured);
                        possible_problems
                            .extend(statuses.into_iter().map(CheckStatus::for_entire_locale));
                    }
                    Err(err) => {
                        warn!("{} could not be configured for {locale}: {err}", member.id());
                        possible_problems.push(configure_failure(member.id(), &err));
                    }
                }
                if show_times {
                    info!(
                        "Setup time for {} on {locale}: {:?}",
                        member.id(),
                        started.elapsed()
                    );
                }
            }
        }

        if show_times {
            info!("Overall setup time for {locale}: {:?}", overall.elapsed());
        }

        let exclusions: Vec<ExclusionFilter> = exclusions
            .iter()
            .filter(|e| e.applies_to(locale))
            .cloned()
            .collect();
        debug!(
            "Configured {} check(s) for {locale} with {} exclusion filter(s)",
            members.len(),
            exclusions.len()
        );

        ConfiguredChain {
            locale: locale.clone(),
            source,
            options: options.clone(),
            members,
            possible_problems,
            exclusions,
        }
    }
}

fn configure_failure(id: CheckId, err: &LocaleChecksError) -> CheckStatus {
    let subtype = match err {
        LocaleChecksError::UnknownLocale(_) => Subtype::CouldNotResolveLocale,
        _ => Subtype::InternalError,
    };
    CheckStatus::error(
        subtype,
        CheckId::Chain,
        Message::new("Internal error in {0}: {1}").arg(id).arg(err),
    )
    .for_entire_locale()
}

/// A chain configured for one locale and option set.
pub struct ConfiguredChain {
    locale: LocaleId,
    source: Arc<dyn LocaleSource>,
    options: CheckOptions,
    members: Vec<Box<dyn ConfiguredCheck>>,
    possible_problems: Vec<CheckStatus>,
    exclusions: Vec<ExclusionFilter>,
}

impl ConfiguredChain {
    pub fn locale(&self) -> &LocaleId {
        &self.locale
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Diagnostics about the locale as a whole, collected while configuring.
    pub fn possible_problems(&self) -> &[CheckStatus] {
        &self.possible_problems
    }

    pub fn member_ids(&self) -> Vec<CheckId> {
        self.members.iter().map(|m| m.id()).collect()
    }

    /// Runs every member on one data point and concatenates what they report.
    pub fn check(&self, path: &XPath, full_path: &XPath, value: &str) -> Vec<CheckStatus> {
        // Proposed alternates are not release candidates
        if self.options.phase() == Phase::FinalTesting
            && path.contains("proposed")
            && path.contains("[@alt=")
        {
            return Vec::new();
        }

        // Check what the marker stands for, not the marker itself
        let inherited;
        let value = if value == INHERITANCE_MARKER {
            inherited = self.source.inherited_value(&self.locale, path);
            inherited.as_deref().unwrap_or(value)
        } else {
            value
        };

        let input = CheckInput {
            path,
            full_path,
            value,
        };
        let mut result = Vec::new();
        for member in &self.members {
            let found = member.check(&input, &self.options, &result);
            result.extend(found);
        }
        result.retain(|status| !self.is_excluded(path, status));
        result
    }

    pub fn get_examples(&self, path: &XPath, full_path: &XPath, value: &str) -> Vec<CheckStatus> {
        let input = CheckInput {
            path,
            full_path,
            value,
        };
        self.members
            .iter()
            .flat_map(|member| member.get_examples(&input, &self.options))
            .collect()
    }

    fn is_excluded(&self, path: &XPath, status: &CheckStatus) -> bool {
        self.exclusions.iter().any(|e| e.excludes(path, status))
    }
}
