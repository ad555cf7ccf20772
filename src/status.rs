//! Diagnostics produced by checks.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("valid regex"));

/// Which check produced a diagnostic. Suppression across checks looks at this
/// tag, never at the concrete check type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckId {
    /// The chain itself, e.g. for a member that failed to configure.
    Chain,
    InheritanceMarker,
    Children,
    LogicalGroupings,
    RootValues,
}

impl CheckId {
    pub fn name(&self) -> &'static str {
        match self {
            CheckId::Chain => "CheckChain",
            CheckId::InheritanceMarker => "CheckForInheritanceMarkers",
            CheckId::Children => "CheckChildren",
            CheckId::LogicalGroupings => "CheckLogicalGroupings",
            CheckId::RootValues => "CheckRootValues",
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Example,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subtype {
    None,
    InternalError,
    CouldNotResolveLocale,
    ValueAlwaysOverridden,
    ValueMatchesRoot,
    NewFieldNeedsReview,
    IncompleteLogicalGroup,
    InconsistentDraftStatus,
    InheritanceMarkerNotAllowed,
}

impl Subtype {
    pub fn name(&self) -> &'static str {
        match self {
            Subtype::None => "none",
            Subtype::InternalError => "internalError",
            Subtype::CouldNotResolveLocale => "couldNotResolveLocale",
            Subtype::ValueAlwaysOverridden => "valueAlwaysOverridden",
            Subtype::ValueMatchesRoot => "valueMatchesRoot",
            Subtype::NewFieldNeedsReview => "newFieldNeedsReview",
            Subtype::IncompleteLogicalGroup => "incompleteLogicalGroup",
            Subtype::InconsistentDraftStatus => "inconsistentDraftStatus",
            Subtype::InheritanceMarkerNotAllowed => "inheritanceMarkerNotAllowed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Subtype::None,
            Subtype::InternalError,
            Subtype::CouldNotResolveLocale,
            Subtype::ValueAlwaysOverridden,
            Subtype::ValueMatchesRoot,
            Subtype::NewFieldNeedsReview,
            Subtype::IncompleteLogicalGroup,
            Subtype::InconsistentDraftStatus,
            Subtype::InheritanceMarkerNotAllowed,
        ]
        .into_iter()
        .find(|s| s.name() == name)
    }
}

impl fmt::Display for Subtype {
    /// "valueAlwaysOverridden" displays as "value always overridden".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for c in self.name().chars() {
            if c.is_ascii_uppercase() {
                out.push(' ');
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        f.write_str(&out)
    }
}

/// A message template with positional `{0}`-style arguments, rendered on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub template: String,
    pub args: Vec<String>,
}

impl Message {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Placeholders without a matching argument are left as written.
    pub fn render(&self) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.args.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One diagnostic. Pure output: nothing reads it back except for display and
/// cross-check suppression inside a single chain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatus {
    pub severity: Severity,
    pub subtype: Subtype,
    pub message: Message,
    pub origin: CheckId,
    /// Set for configuration-time diagnostics, which describe the whole locale
    /// rather than one path.
    #[serde(default)]
    pub entire_locale: bool,
}

impl CheckStatus {
    pub fn new(severity: Severity, subtype: Subtype, origin: CheckId, message: Message) -> Self {
        Self {
            severity,
            subtype,
            message,
            origin,
            entire_locale: false,
        }
    }

    pub fn error(subtype: Subtype, origin: CheckId, message: Message) -> Self {
        Self::new(Severity::Error, subtype, origin, message)
    }

    pub fn warning(subtype: Subtype, origin: CheckId, message: Message) -> Self {
        Self::new(Severity::Warning, subtype, origin, message)
    }

    pub fn example(origin: CheckId, message: Message) -> Self {
        Self::new(Severity::Example, Subtype::None, origin, message)
    }

    pub fn for_entire_locale(mut self) -> Self {
        self.entire_locale = true;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_problem(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Warning)
    }

    pub fn has_error(statuses: &[CheckStatus]) -> bool {
        Self::has_severity(statuses, Severity::Error)
    }

    pub fn has_severity(statuses: &[CheckStatus], severity: Severity) -> bool {
        statuses.iter().any(|s| s.severity == severity)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Example => "Example",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_render() {
        let message = Message::new("Value always overridden in children: {0}").arg("fr_CA, fr_CH");
        assert_eq!(
            message.render(),
            "Value always overridden in children: fr_CA, fr_CH"
        );
    }

    #[test]
    fn test_message_missing_argument_left_alone() {
        let message = Message::new("{0} and {1}").arg("one");
        assert_eq!(message.render(), "one and {1}");
    }

    #[test]
    fn test_subtype_display() {
        assert_eq!(
            Subtype::ValueAlwaysOverridden.to_string(),
            "value always overridden"
        );
        assert_eq!(
            Subtype::from_name("incompleteLogicalGroup"),
            Some(Subtype::IncompleteLogicalGroup)
        );
        assert_eq!(Subtype::from_name("nope"), None);
    }

    #[test]
    fn test_serialized_form() {
        let status = CheckStatus::warning(
            Subtype::IncompleteLogicalGroup,
            CheckId::LogicalGroupings,
            Message::new("Incomplete logical group"),
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["subtype"], "incompleteLogicalGroup");
        assert_eq!(json["origin"], "LogicalGroupings");
    }

    #[test]
    fn test_has_error() {
        let warning = CheckStatus::warning(
            Subtype::ValueMatchesRoot,
            CheckId::RootValues,
            Message::new("w"),
        );
        assert!(!CheckStatus::has_error(std::slice::from_ref(&warning)));
        let error = CheckStatus::error(
            Subtype::ValueAlwaysOverridden,
            CheckId::Children,
            Message::new("e"),
        );
        assert!(CheckStatus::has_error(&[warning, error]));
    }
}
