//! Logical groups must be authored as a unit.
//!
//! A group nobody has touched is fine. Once one member is authored in the
//! locale, every non-optional member has to be. In `FINAL_TESTING` the members
//! that are present must also agree on their draft status.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{Check, CheckInput, Configured};
use crate::error::LocaleChecksError;
use crate::grouping::LogicalGroupResolver;
use crate::locale::{LocaleId, LocaleSource};
use crate::options::{CheckOptions, OptionKey, Phase};
use crate::status::{CheckId, CheckStatus, Message, Severity, Subtype};
use crate::xpath::XPath;

pub struct LogicalGroupsCheck {
    resolver: Arc<dyn LogicalGroupResolver>,
}

impl LogicalGroupsCheck {
    pub fn new(resolver: Arc<dyn LogicalGroupResolver>) -> Self {
        Self { resolver }
    }
}

pub struct LogicalGroupsContext {
    locale: LocaleId,
    source: Arc<dyn LocaleSource>,
}

impl Check for LogicalGroupsCheck {
    type Context = LogicalGroupsContext;

    fn id(&self) -> CheckId {
        CheckId::LogicalGroupings
    }

    fn configure(
        &self,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        _options: &CheckOptions,
    ) -> Result<Configured<LogicalGroupsContext>, LocaleChecksError> {
        Ok(Configured::new(LogicalGroupsContext {
            locale: locale.clone(),
            source: Arc::clone(source),
        }))
    }

    fn check(
        &self,
        context: &LogicalGroupsContext,
        input: &CheckInput<'_>,
        options: &CheckOptions,
        _prior: &[CheckStatus],
    ) -> Vec<CheckStatus> {
        let group = self.resolver.group(&context.locale, input.path);
        if group.len() < 2 {
            return Vec::new();
        }

        let present: Vec<&XPath> = group
            .iter()
            .filter(|member| context.source.is_here(&context.locale, member))
            .collect();
        if present.is_empty() {
            return Vec::new();
        }

        let mut result = Vec::new();

        let missing: Vec<&XPath> = group
            .iter()
            .filter(|member| !present.contains(member))
            .filter(|member| !self.resolver.is_optional(&context.locale, member))
            .collect();
        if !missing.is_empty() {
            let severity = if options.phase() == Phase::Submission
                || options.flag(OptionKey::LogicalGroupWarning)
            {
                Severity::Warning
            } else {
                Severity::Error
            };
            let names: Vec<String> = missing.iter().map(|m| short_name(m)).collect();
            result.push(CheckStatus::new(
                severity,
                Subtype::IncompleteLogicalGroup,
                CheckId::LogicalGroupings,
                Message::new("Incomplete logical group; missing {0} of {1}: {2}")
                    .arg(missing.len())
                    .arg(group.len())
                    .arg(names.join(", ")),
            ));
        }

        if options.phase() == Phase::FinalTesting {
            let drafts: BTreeSet<String> = present
                .iter()
                .map(|member| {
                    context
                        .source
                        .full_path(&context.locale, member)
                        .draft_status()
                })
                .collect();
            if drafts.len() > 1 {
                let drafts: Vec<String> = drafts.into_iter().collect();
                result.push(CheckStatus::error(
                    Subtype::InconsistentDraftStatus,
                    CheckId::LogicalGroupings,
                    Message::new("Logical group has inconsistent draft status: {0}")
                        .arg(drafts.join(", ")),
                ));
            }
        }

        result
    }
}

/// The last element with its attributes, which is what tells group members apart.
fn short_name(path: &XPath) -> String {
    match path.parts() {
        Ok(parts) => match parts.elements.last() {
            Some(last) => {
                let mut name = last.name.clone();
                for (key, value) in &last.attributes {
                    name.push_str(&format!("[@{key}=\"{value}\"]"));
                }
                name
            }
            None => path.to_string(),
        },
        Err(_) => path.to_string(),
    }
}
