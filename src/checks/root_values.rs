//! Values that match root, and fields added recently enough to need review.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Check, CheckInput, Configured};
use crate::error::LocaleChecksError;
use crate::locale::{LocaleId, LocaleSource};
use crate::options::CheckOptions;
use crate::status::{CheckId, CheckStatus, Message, Subtype};

/// Elements whose root value tends to leak unchanged into child locales.
const ROOT_LEAK_ELEMENTS: &[&str] = &[
    "exemplarCity",
    "month",
    "day",
    "quarter",
    "era",
    "dayPeriod",
    "symbol",
];

pub(super) static NEW_FIELD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^//ldml/personNames/",
        r"^//ldml/characterLabels/",
        r"^//ldml/typographicNames/",
        r#"^//ldml/units/unitLength\[@type="[^"]+"\]/unit\[@type="(?:concentr-portion-per-1e9|speed-beaufort|light-night|duration-night)"\]"#,
        r"^//ldml/numbers/rationalFormats",
        r#"^//ldml/dates/fields/field\[@type="[^"]*-(?:narrow|short)"\]/relativePeriod"#,
        r#"^//ldml/localeDisplayNames/keys/key\[@type="(?:dx|mu|rg|sd)"\]"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid new field pattern"))
    .collect()
});

pub struct RootValuesCheck;

pub struct RootValuesContext {
    root: LocaleId,
    source: Arc<dyn LocaleSource>,
    english_or_root: bool,
    /// No sub-tags, e.g. `fr` rather than `fr_CA`.
    base: bool,
}

impl RootValuesContext {
    fn root_value(&self, input: &CheckInput<'_>) -> Option<String> {
        self.source.resolved_value(&self.root, input.path)
    }
}

impl Check for RootValuesCheck {
    type Context = RootValuesContext;

    fn id(&self) -> CheckId {
        CheckId::RootValues
    }

    fn configure(
        &self,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        _options: &CheckOptions,
    ) -> Result<Configured<RootValuesContext>, LocaleChecksError> {
        let root = LocaleId::root();
        if !source.contains(&root) {
            return Err(LocaleChecksError::UnknownLocale(root));
        }
        Ok(Configured::new(RootValuesContext {
            english_or_root: locale.is_root() || locale.language() == "en",
            base: !locale.has_subtags(),
            root,
            source: Arc::clone(source),
        }))
    }

    fn check(
        &self,
        context: &RootValuesContext,
        input: &CheckInput<'_>,
        _options: &CheckOptions,
        prior: &[CheckStatus],
    ) -> Vec<CheckStatus> {
        let mut result = Vec::new();

        let leaks = !context.english_or_root
            && ROOT_LEAK_ELEMENTS
                .iter()
                .any(|element| input.path.contains_element(element));
        let regional = !context.base && !input.path.starts_with("//ldml/identity");
        if (leaks || regional)
            && context
                .root_value(input)
                .is_some_and(|root_value| root_value == input.value)
        {
            result.push(CheckStatus::warning(
                Subtype::ValueMatchesRoot,
                CheckId::RootValues,
                Message::new("The value {0} is the same as in root; check whether it needs translation")
                    .arg(input.value),
            ));
        }

        let is_new = NEW_FIELD_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(input.path.as_str()));
        let reported_elsewhere = prior
            .iter()
            .any(|status| status.is_problem() && status.origin != CheckId::RootValues);
        if is_new && !reported_elsewhere {
            result.push(CheckStatus::warning(
                Subtype::NewFieldNeedsReview,
                CheckId::RootValues,
                Message::new("This field was added recently; review the value {0}")
                    .arg(input.value),
            ));
        }

        result
    }
}
