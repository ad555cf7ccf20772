use std::sync::Arc;

use super::{Check, CheckInput, Configured};
use crate::error::LocaleChecksError;
use crate::locale::{INHERITANCE_MARKER, LocaleId, LocaleSource};
use crate::options::CheckOptions;
use crate::status::{CheckId, CheckStatus, Message, Subtype};

/// Rejects values that embed the inheritance marker in other text. Its example
/// channel shows what a bare marker resolves to.
pub struct InheritanceMarkerCheck;

pub struct InheritanceMarkerContext {
    locale: LocaleId,
    source: Arc<dyn LocaleSource>,
}

impl Check for InheritanceMarkerCheck {
    type Context = InheritanceMarkerContext;

    fn id(&self) -> CheckId {
        CheckId::InheritanceMarker
    }

    fn configure(
        &self,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        _options: &CheckOptions,
    ) -> Result<Configured<InheritanceMarkerContext>, LocaleChecksError> {
        Ok(Configured::new(InheritanceMarkerContext {
            locale: locale.clone(),
            source: Arc::clone(source),
        }))
    }

    fn check(
        &self,
        _context: &InheritanceMarkerContext,
        input: &CheckInput<'_>,
        _options: &CheckOptions,
        _prior: &[CheckStatus],
    ) -> Vec<CheckStatus> {
        if input.value == INHERITANCE_MARKER || !input.value.contains(INHERITANCE_MARKER) {
            return Vec::new();
        }
        vec![CheckStatus::error(
            Subtype::InheritanceMarkerNotAllowed,
            CheckId::InheritanceMarker,
            Message::new("The inheritance marker {0} may only be used as the entire value")
                .arg(INHERITANCE_MARKER),
        )]
    }

    fn get_examples(
        &self,
        context: &InheritanceMarkerContext,
        input: &CheckInput<'_>,
        _options: &CheckOptions,
    ) -> Vec<CheckStatus> {
        if input.value != INHERITANCE_MARKER {
            return Vec::new();
        }
        let message = match context.source.inherited_value(&context.locale, input.path) {
            Some(inherited) => Message::new("Inherited value: {0}").arg(inherited),
            None => Message::new("Nothing to inherit at {0}").arg(input.path),
        };
        vec![CheckStatus::example(CheckId::InheritanceMarker, message)]
    }
}
