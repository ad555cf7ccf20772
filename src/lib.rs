//! Inheritance-aware validation of hierarchical locale data.
//!
//! A chain of checks inspects each `(path, value)` of a locale against the
//! value a consumer would actually see after inheritance. Configured chains are
//! memoized per locale and option set in a [`cache::ResultCache`], which drops
//! entries for a locale and all of its sublocales whenever the data changes.

pub mod cache;
pub mod checks;
pub mod error;
pub mod grouping;
pub mod locale;
pub mod options;
pub mod status;
pub mod xpath;

pub use cache::{CacheSettings, CacheStats, ExclusionFilter, ResultBundle, ResultCache};
pub use checks::{Check, CheckChain, standard_checks};
pub use error::LocaleChecksError;
pub use locale::{LocaleId, LocaleSource, memory::MemoryLocaleTree};
pub use options::{CheckOptions, Phase};
pub use status::{CheckId, CheckStatus, Severity, Subtype};
pub use xpath::XPath;
