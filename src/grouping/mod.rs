//! Logical groups: sets of sibling paths that have to be filled in together.


use std::collections::BTreeSet;

use crate::locale::LocaleId;
use crate::xpath::{XPath, XPathParts};

/// Maps a path to every path in its logical group, the path itself included.
pub trait LogicalGroupResolver: Send + Sync {
    /// Fewer than two members means the path is not part of a group.
    fn group(&self, locale: &LocaleId, path: &XPath) -> BTreeSet<XPath>;

    /// Optional members never make a group incomplete.
    fn is_optional(&self, _locale: &LocaleId, _path: &XPath) -> bool {
        false
    }
}

/// Metazones that observe daylight saving time, and therefore have
/// generic/standard/daylight name variants.
pub const METAZONES_WITH_DST: &[&str] = &[
    "Acre", "Africa_Western", "Alaska", "Almaty", "Amazon", "America_Central",
    "America_Eastern", "America_Mountain", "America_Pacific", "Anadyr", "Apia",
    "Aqtau", "Aqtobe", "Arabian", "Argentina", "Argentina_Western", "Armenia",
    "Atlantic", "Australia_Central", "Australia_CentralWestern", "Australia_Eastern",
    "Australia_Western", "Azerbaijan", "Azores", "Bangladesh", "Brasilia", "Cape_Verde",
    "Chatham", "Chile", "China", "Choibalsan", "Colombia", "Cook", "Cuba", "Easter",
    "Europe_Central", "Europe_Eastern", "Europe_Western", "Falkland", "Fiji", "Georgia",
    "Greenland_Eastern", "Greenland_Western", "Hawaii_Aleutian", "Hong_Kong", "Hovd",
    "Iran", "Irkutsk", "Israel", "Japan", "Kamchatka", "Korea", "Krasnoyarsk",
    "Lord_Howe", "Macau", "Magadan", "Mauritius", "Mexico_Northwest", "Mexico_Pacific",
    "Mongolia", "Moscow", "New_Caledonia", "New_Zealand", "Newfoundland", "Norfolk",
    "Noronha", "Novosibirsk", "Omsk", "Pakistan", "Paraguay", "Peru", "Philippines",
    "Pierre_Miquelon", "Qyzylorda", "Sakhalin", "Samara", "Samoa", "Taipei", "Tonga",
    "Turkmenistan", "Uruguay", "Uzbekistan", "Vanuatu", "Vladivostok", "Volgograd",
    "Yakutsk", "Yekaterinburg",
];

const ZONE_VARIANTS: [&str; 3] = ["generic", "standard", "daylight"];
const DAYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
const AM_PM: [&str; 2] = ["am", "pm"];
const QUARTERS: [&str; 4] = ["1", "2", "3", "4"];
/// The first case is the default and is written without a `case` attribute.
const DEFAULT_CASES: [&str; 4] = ["nominative", "accusative", "dative", "genitive"];

const CALENDARS_WITH_13_MONTHS: [&str; 3] = ["coptic", "ethiopic", "hebrew"];
/// The leap month of the hebrew calendar, tagged `yeartype="leap"`.
const HEBREW_LEAP_MONTH: u32 = 7;

/// Fields where relative `0` ("now", "this hour") stands alone.
const NOW_UNITS: [&str; 9] = [
    "second", "second-short", "second-narrow",
    "minute", "minute-short", "minute-narrow",
    "hour", "hour-short", "hour-narrow",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Singleton,
    Metazone,
    Days,
    DayPeriods,
    Quarters,
    Months { calendar_months: u32, hebrew: bool },
    Relative { limit: i32 },
    GrammaticalCase,
}

/// The built-in groupings: DST metazone names, weekdays, am/pm, quarters,
/// months, relative fields and grammatical case variants of unit patterns.
#[derive(Debug, Clone)]
pub struct StandardGroupings {
    cases: Vec<String>,
}

impl Default for StandardGroupings {
    fn default() -> Self {
        Self {
            cases: DEFAULT_CASES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl StandardGroupings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the grammatical cases that make up a case group. The first one
    /// is the default case.
    pub fn with_cases<I, S>(mut self, cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cases = cases.into_iter().map(Into::into).collect();
        self
    }

    fn classify(&self, path: &XPath, parts: &XPathParts) -> GroupKind {
        if path.contains("[@alt=") || parts.contains_element("alias") {
            return GroupKind::Singleton;
        }
        if parts.contains_element("metazone") {
            let variant = parts.elements.last().map(|e| e.name.as_str());
            let observes_dst = parts
                .find_attribute_value("metazone", "type")
                .is_some_and(|zone| METAZONES_WITH_DST.contains(&zone));
            if observes_dst && variant.is_some_and(|v| ZONE_VARIANTS.contains(&v)) {
                return GroupKind::Metazone;
            }
            return GroupKind::Singleton;
        }
        if parts.contains_element("day")
            && parts
                .find_attribute_value("day", "type")
                .is_some_and(|d| DAYS.contains(&d))
        {
            return GroupKind::Days;
        }
        if parts
            .find_attribute_value("dayPeriod", "type")
            .is_some_and(|p| AM_PM.contains(&p))
        {
            return GroupKind::DayPeriods;
        }
        if parts
            .find_attribute_value("quarter", "type")
            .is_some_and(|q| QUARTERS.contains(&q))
        {
            return GroupKind::Quarters;
        }
        if parts.contains_element("months") {
            return Self::classify_month(parts);
        }
        if parts.contains_element("relative") {
            return Self::classify_relative(parts);
        }
        if path.contains(r#"/unitLength[@type="long"]"#)
            && path.contains("/unitPattern[")
            && self.cases.len() > 1
        {
            return GroupKind::GrammaticalCase;
        }
        GroupKind::Singleton
    }

    fn classify_month(parts: &XPathParts) -> GroupKind {
        let calendar = parts.find_attribute_value("calendar", "type");
        let calendar_months = if calendar.is_some_and(|c| CALENDARS_WITH_13_MONTHS.contains(&c)) {
            13
        } else {
            12
        };
        let month = parts
            .find_attribute_value("month", "type")
            .and_then(|m| m.parse::<u32>().ok());
        match month {
            Some(m) if (1..=calendar_months).contains(&m) => GroupKind::Months {
                calendar_months,
                hebrew: calendar == Some("hebrew"),
            },
            _ => GroupKind::Singleton,
        }
    }

    fn classify_relative(parts: &XPathParts) -> GroupKind {
        let field = parts.find_attribute_value("field", "type");
        let Some(offset) = parts
            .find_attribute_value("relative", "type")
            .and_then(|r| r.parse::<i32>().ok())
        else {
            return GroupKind::Singleton;
        };
        if offset == 0 && field.is_some_and(|f| NOW_UNITS.contains(&f)) {
            return GroupKind::Singleton;
        }
        let limit = if field.is_some_and(|f| f.starts_with("day")) {
            3
        } else {
            1
        };
        if offset.abs() > limit {
            return GroupKind::Singleton;
        }
        GroupKind::Relative { limit }
    }

    fn siblings(&self, kind: GroupKind, parts: &XPathParts) -> BTreeSet<XPath> {
        let vary = |element: &str, attribute: &str, values: &[&str]| -> BTreeSet<XPath> {
            values
                .iter()
                .map(|value| {
                    let mut sibling = parts.clone();
                    sibling.set_attribute(element, attribute, value);
                    sibling.to_xpath()
                })
                .collect()
        };

        match kind {
            GroupKind::Singleton => BTreeSet::from([parts.to_xpath()]),
            GroupKind::Metazone => ZONE_VARIANTS
                .iter()
                .map(|variant| {
                    let mut sibling = parts.clone();
                    sibling.set_last_element(variant);
                    sibling.to_xpath()
                })
                .collect(),
            GroupKind::Days => vary("day", "type", &DAYS[..]),
            GroupKind::DayPeriods => vary("dayPeriod", "type", &AM_PM[..]),
            GroupKind::Quarters => vary("quarter", "type", &QUARTERS[..]),
            GroupKind::Months {
                calendar_months,
                hebrew,
            } => {
                let mut group = BTreeSet::new();
                for month in 1..=calendar_months {
                    let mut sibling = parts.clone();
                    sibling.set_attribute("month", "type", &month.to_string());
                    sibling.remove_attribute("month", "yeartype");
                    group.insert(sibling.to_xpath());
                }
                if hebrew {
                    let mut leap = parts.clone();
                    leap.set_attribute("month", "type", &HEBREW_LEAP_MONTH.to_string());
                    leap.set_attribute("month", "yeartype", "leap");
                    group.insert(leap.to_xpath());
                }
                group
            }
            GroupKind::Relative { limit } => {
                let offsets: Vec<String> = (-limit..=limit).map(|i| i.to_string()).collect();
                let offsets: Vec<&str> = offsets.iter().map(String::as_str).collect();
                vary("relative", "type", offsets.as_slice())
            }
            GroupKind::GrammaticalCase => {
                let Some(last) = parts.elements.last().map(|e| e.name.clone()) else {
                    return BTreeSet::new();
                };
                self.cases
                    .iter()
                    .enumerate()
                    .map(|(index, case)| {
                        let mut sibling = parts.clone();
                        if index == 0 {
                            sibling.remove_attribute(&last, "case");
                        } else {
                            sibling.set_attribute(&last, "case", case);
                        }
                        sibling.to_xpath()
                    })
                    .collect()
            }
        }
    }
}

impl LogicalGroupResolver for StandardGroupings {
    fn group(&self, _locale: &LocaleId, path: &XPath) -> BTreeSet<XPath> {
        // Every group lives under dates/ or is a long unit pattern
        if !path.starts_with("//ldml/dates") && !path.contains(r#"/unitLength[@type="long"]"#) {
            return BTreeSet::from([path.clone()]);
        }
        let Ok(parts) = path.parts() else {
            return BTreeSet::from([path.clone()]);
        };
        match self.classify(path, &parts) {
            GroupKind::Singleton => BTreeSet::from([path.clone()]),
            kind => self.siblings(kind, &parts),
        }
    }

    /// Relative days two or three away from today are optional.
    fn is_optional(&self, _locale: &LocaleId, path: &XPath) -> bool {
        if !path.contains("relative") {
            return false;
        }
        let Ok(parts) = path.parts() else {
            return false;
        };
        let day_field = parts
            .find_attribute_value("field", "type")
            .is_some_and(|f| f.starts_with("day"));
        let distance = parts
            .find_attribute_value("relative", "type")
            .and_then(|r| r.parse::<i32>().ok());
        day_field && distance.is_some_and(|d| d.abs() >= 2)
    }
}
