//! Error types shared across the crate

use miette::Diagnostic;
use thiserror::Error;

use crate::locale::LocaleId;

#[derive(Error, Debug, Diagnostic)]
pub enum LocaleChecksError {
    #[error("Unknown locale '{0}'")]
    #[diagnostic(
        code(locale_checks::unknown_locale),
        help("The locale source has no data for this identifier")
    )]
    UnknownLocale(LocaleId),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Unknown check option '{key}'")]
    #[diagnostic(
        code(locale_checks::options::unknown_key),
        help("Valid keys are: {valid}")
    )]
    UnknownKey { key: String, valid: String },

    #[error("Unknown phase '{0}'")]
    #[diagnostic(
        code(locale_checks::options::unknown_phase),
        help("Use one of BUILD, SUBMISSION, VETTING, FINAL_TESTING (or RESOLUTION)")
    )]
    UnknownPhase(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("Failed to parse YAML")]
    #[diagnostic(code(locale_checks::load::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid regex '{pattern}' in {field}")]
    #[diagnostic(code(locale_checks::load::regex))]
    Regex {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Malformed path '{0}'")]
    #[diagnostic(
        code(locale_checks::load::path),
        help("Paths look like //ldml/element[@attribute=\"value\"]/child")
    )]
    MalformedPath(String),
}
