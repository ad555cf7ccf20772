//! Check options: the configuration half of a cache key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::OptionsError;

/// Where in the data release cycle the checks are being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Build,
    Submission,
    Vetting,
    FinalTesting,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Build => "BUILD",
            Phase::Submission => "SUBMISSION",
            Phase::Vetting => "VETTING",
            Phase::FinalTesting => "FINAL_TESTING",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUILD" => Ok(Phase::Build),
            "SUBMISSION" => Ok(Phase::Submission),
            "VETTING" => Ok(Phase::Vetting),
            "FINAL_TESTING" | "RESOLUTION" => Ok(Phase::FinalTesting),
            _ => Err(OptionsError::UnknownPhase(s.to_string())),
        }
    }
}

/// The closed set of recognized option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    Phase,
    LogicalGroupWarning,
    ShowTimes,
}

impl OptionKey {
    pub const ALL: [OptionKey; 3] = [
        OptionKey::Phase,
        OptionKey::LogicalGroupWarning,
        OptionKey::ShowTimes,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OptionKey::Phase => "phase",
            OptionKey::LogicalGroupWarning => "lgWarningCheck",
            OptionKey::ShowTimes => "SHOW_TIMES",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, OptionsError> {
        Self::ALL
            .into_iter()
            .find(|o| o.key() == key)
            .ok_or_else(|| OptionsError::UnknownKey {
                key: key.to_string(),
                valid: Self::ALL.map(|o| o.key()).join(", "),
            })
    }
}

/// Immutable option set. Two option sets with the same pairs are the same
/// cache entry, see [`CheckOptions::cache_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct CheckOptions {
    values: BTreeMap<OptionKey, String>,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_phase(phase: Phase) -> Self {
        Self::new().with(OptionKey::Phase, phase.as_str())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (key, value) in pairs {
            let key = OptionKey::from_key(key.as_ref())?;
            let mut value = value.into();
            if key == OptionKey::Phase {
                value = value.parse::<Phase>()?.as_str().to_string();
            }
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Returns a copy with `key` set. The phase value is normalized.
    pub fn with(&self, key: OptionKey, value: impl Into<String>) -> Self {
        let mut values = self.values.clone();
        let mut value = value.into();
        if key == OptionKey::Phase
            && let Ok(phase) = value.parse::<Phase>()
        {
            value = phase.as_str().to_string();
        }
        values.insert(key, value);
        Self { values }
    }

    pub fn get(&self, key: OptionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn flag(&self, key: OptionKey) -> bool {
        self.get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }

    /// Defaults to [`Phase::Submission`] when unset.
    pub fn phase(&self) -> Phase {
        self.get(OptionKey::Phase)
            .and_then(|v| v.parse().ok())
            .unwrap_or(Phase::Submission)
    }

    /// Deterministic content hash: hex SHA-256 over each key and value in key
    /// order, every field prefixed with its byte length.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in &self.values {
            for field in [key.key(), value.as_str()] {
                hasher.update((field.len() as u64).to_be_bytes());
                hasher.update(field.as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

impl TryFrom<BTreeMap<String, String>> for CheckOptions {
    type Error = OptionsError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<CheckOptions> for BTreeMap<String, String> {
    fn from(options: CheckOptions) -> Self {
        options
            .values
            .into_iter()
            .map(|(k, v)| (k.key().to_string(), v))
            .collect()
    }
}

impl fmt::Display for CheckOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{}={v}", k.key()))
            .collect();
        write!(f, "Options:{{{}}}", pairs.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parsing() {
        assert_eq!("submission".parse::<Phase>().unwrap(), Phase::Submission);
        assert_eq!("RESOLUTION".parse::<Phase>().unwrap(), Phase::FinalTesting);
        assert_eq!("final_testing".parse::<Phase>().unwrap(), Phase::FinalTesting);
        assert!(matches!(
            "shipping".parse::<Phase>(),
            Err(OptionsError::UnknownPhase(_))
        ));
    }

    #[test]
    fn test_default_phase_is_submission() {
        assert_eq!(CheckOptions::new().phase(), Phase::Submission);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CheckOptions::from_pairs([("colour", "blue")]).unwrap_err();
        match err {
            OptionsError::UnknownKey { key, valid } => {
                assert_eq!(key, "colour");
                assert!(valid.contains("lgWarningCheck"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(CheckOptions::from_pairs([("CoverageLevel.requiredLevel", "modern")]).is_err());
    }

    #[test]
    fn test_cache_key_is_content_addressed() {
        let a = CheckOptions::from_pairs([("phase", "submission"), ("lgWarningCheck", "true")])
            .unwrap();
        let b = CheckOptions::new()
            .with(OptionKey::LogicalGroupWarning, "true")
            .with(OptionKey::Phase, "SUBMISSION");
        assert_eq!(a, b);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().len(), 64);

        let c = CheckOptions::for_phase(Phase::Vetting);
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_cache_key_separates_embedded_newlines() {
        let folded = CheckOptions::new().with(OptionKey::ShowTimes, "1\nlgWarningCheck=true");
        let split = CheckOptions::new()
            .with(OptionKey::ShowTimes, "1")
            .with(OptionKey::LogicalGroupWarning, "true");
        assert_ne!(folded, split);
        assert_ne!(folded.cache_key(), split.cache_key());

        // An empty value is still a value
        let empty = CheckOptions::new().with(OptionKey::ShowTimes, "");
        assert_ne!(CheckOptions::new().cache_key(), empty.cache_key());
    }

    #[test]
    fn test_flag() {
        let options = CheckOptions::new().with(OptionKey::ShowTimes, "TRUE");
        assert!(options.flag(OptionKey::ShowTimes));
        assert!(!options.flag(OptionKey::LogicalGroupWarning));
    }

    #[test]
    fn test_yaml_round_trip_uses_wire_keys() {
        let options: CheckOptions =
            serde_yaml::from_str("phase: RESOLUTION\nlgWarningCheck: 'true'\n").unwrap();
        assert_eq!(options.phase(), Phase::FinalTesting);
        let yaml = serde_yaml::to_string(&options).unwrap();
        assert!(yaml.contains("lgWarningCheck"));
    }
}
