//! The check dispatch contract.
//!
//! A [`Check`] is configured once per locale. Configuration does not mutate the
//! check: it returns a fresh context value, and every later `check` call reads
//! that context. One check instance can therefore serve any number of locales
//! at once.

mod chain;
pub mod children;
pub mod inheritance_marker;
pub mod logical_groups;
pub mod root_values;


use std::sync::Arc;

use crate::error::LocaleChecksError;
use crate::grouping::{LogicalGroupResolver, StandardGroupings};
use crate::locale::{LocaleId, LocaleSource};
use crate::options::CheckOptions;
use crate::status::{CheckId, CheckStatus};
use crate::xpath::XPath;

pub use chain::{CheckChain, ConfiguredChain};
pub use children::ChildrenCheck;
pub use inheritance_marker::InheritanceMarkerCheck;
pub use logical_groups::LogicalGroupsCheck;
pub use root_values::RootValuesCheck;

/// One data point handed to a check.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    pub path: &'a XPath,
    /// The same path with every attribute, `draft` included.
    pub full_path: &'a XPath,
    pub value: &'a str,
}

/// What a successful `configure` produces.
pub struct Configured<C> {
    pub context: C,
    /// Problems with the locale as a whole, found while configuring.
    pub statuses: Vec<CheckStatus>,
}

impl<C> Configured<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            statuses: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: CheckStatus) -> Self {
        self.statuses.push(status);
        self
    }
}

pub trait Check: Send + Sync + 'static {
    type Context: Send + Sync + 'static;

    fn id(&self) -> CheckId;

    /// Precomputes per-locale state. An `Err` turns the check into a no-op for
    /// this locale; the chain reports it as a diagnostic.
    fn configure(
        &self,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        options: &CheckOptions,
    ) -> Result<Configured<Self::Context>, LocaleChecksError>;

    /// Must return quickly for paths the check does not care about.
    ///
    /// `prior` holds what earlier checks in the chain reported for this same call.
    fn check(
        &self,
        context: &Self::Context,
        input: &CheckInput<'_>,
        options: &CheckOptions,
        prior: &[CheckStatus],
    ) -> Vec<CheckStatus>;

    fn get_examples(
        &self,
        _context: &Self::Context,
        _input: &CheckInput<'_>,
        _options: &CheckOptions,
    ) -> Vec<CheckStatus> {
        Vec::new()
    }
}

/// A check bound to the context it was configured with.
pub trait ConfiguredCheck: Send + Sync {
    fn id(&self) -> CheckId;

    fn check(
        &self,
        input: &CheckInput<'_>,
        options: &CheckOptions,
        prior: &[CheckStatus],
    ) -> Vec<CheckStatus>;

    fn get_examples(&self, input: &CheckInput<'_>, options: &CheckOptions) -> Vec<CheckStatus>;
}

struct Bound<C: Check> {
    check: Arc<C>,
    context: C::Context,
}

impl<C: Check> ConfiguredCheck for Bound<C> {
    fn id(&self) -> CheckId {
        Check::id(&*self.check)
    }

    fn check(
        &self,
        input: &CheckInput<'_>,
        options: &CheckOptions,
        prior: &[CheckStatus],
    ) -> Vec<CheckStatus> {
        self.check.check(&self.context, input, options, prior)
    }

    fn get_examples(&self, input: &CheckInput<'_>, options: &CheckOptions) -> Vec<CheckStatus> {
        self.check.get_examples(&self.context, input, options)
    }
}

/// Object-safe face of [`Check`], so a chain can hold checks with different
/// context types.
pub(crate) trait DynCheck: Send + Sync {
    fn id(&self) -> CheckId;

    fn configure_dyn(
        self: Arc<Self>,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        options: &CheckOptions,
    ) -> Result<(Box<dyn ConfiguredCheck>, Vec<CheckStatus>), LocaleChecksError>;
}

impl<C: Check> DynCheck for C {
    fn id(&self) -> CheckId {
        Check::id(self)
    }

    fn configure_dyn(
        self: Arc<Self>,
        locale: &LocaleId,
        source: &Arc<dyn LocaleSource>,
        options: &CheckOptions,
    ) -> Result<(Box<dyn ConfiguredCheck>, Vec<CheckStatus>), LocaleChecksError> {
        let Configured { context, statuses } = self.configure(locale, source, options)?;
        let bound: Box<dyn ConfiguredCheck> = Box::new(Bound {
            check: self,
            context,
        });
        Ok((bound, statuses))
    }
}

/// The full set of checks, in registration order. The root value check runs
/// last because it looks at what the others reported.
pub fn standard_checks() -> CheckChain {
    standard_checks_with(Arc::new(StandardGroupings::new()))
}

pub fn standard_checks_with(resolver: Arc<dyn LogicalGroupResolver>) -> CheckChain {
    CheckChain::new()
        .add(InheritanceMarkerCheck)
        .add(ChildrenCheck)
        .add(LogicalGroupsCheck::new(resolver))
        .add(RootValuesCheck)
}
