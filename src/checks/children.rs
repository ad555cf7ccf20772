//! Flags parent values that no immediate child ever shows.
//!
//! If every child of `fr` overrides a path, the value in `fr` is unreachable
//! at runtime: nobody inherits it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{Check, CheckInput, Configured};
use crate::error::LocaleChecksError;
use crate::locale::{LocaleId, LocaleSource};
use crate::options::CheckOptions;
use crate::status::{CheckId, CheckStatus, Message, Subtype};

pub struct ChildrenCheck;

pub struct ChildrenContext {
    source: Arc<dyn LocaleSource>,
    /// Empty when the locale has no immediate children; every check is then a no-op.
    children: Vec<LocaleId>,
}

impl ChildrenContext {
    pub fn children(&self) -> &[LocaleId] {
        &self.children
    }
}

impl Check for ChildrenCheck {
    type Context = ChildrenContext;

    fn id(&self) -> CheckId {
        CheckId::Children
    }

    fn configure(
        &self,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        _options: &CheckOptions,
    ) -> Result<Configured<ChildrenContext>, LocaleChecksError> {
        let children: Vec<LocaleId> = source
            .children(locale)
            .into_iter()
            .filter(|child| child.is_immediate_child_of(locale))
            .collect();
        if children.is_empty() {
            debug!("{locale} has no immediate children");
        }
        Ok(Configured::new(ChildrenContext {
            source: Arc::clone(source),
            children,
        }))
    }

    fn check(
        &self,
        context: &ChildrenContext,
        input: &CheckInput<'_>,
        _options: &CheckOptions,
        _prior: &[CheckStatus],
    ) -> Vec<CheckStatus> {
        if context.children.is_empty() || input.path.starts_with("//ldml/identity") {
            return Vec::new();
        }

        let mut child_values = BTreeMap::new();
        for child in &context.children {
            let child_value = context.source.resolved_value(child, input.path);
            if child_value.as_deref() == Some(input.value) {
                return Vec::new();
            }
            child_values.insert(child, child_value);
        }

        let names: Vec<&str> = child_values.keys().map(|c| c.as_str()).collect();
        let values: Vec<String> = child_values
            .iter()
            .map(|(child, value)| format!("{child}: {}", value.as_deref().unwrap_or("∅")))
            .collect();

        vec![CheckStatus::error(
            Subtype::ValueAlwaysOverridden,
            CheckId::Children,
            Message::new("Value always overridden in children: {0} ({1})")
                .arg(names.join(", "))
                .arg(values.join("; ")),
        )]
    }
}
