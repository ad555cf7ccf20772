//! Distinguishing paths into locale data.
//!
//! The checks mostly treat an [`XPath`] as an opaque, ordered token. The few
//! structural questions they ask (does the path contain an element, what is the
//! value of an attribute) go through [`XPathParts`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Draft status reported for paths that carry no `draft` attribute.
pub const DEFAULT_DRAFT: &str = "approved";

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XPath(Arc<str>);

impl XPath {
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parts(&self) -> Result<XPathParts, LoadError> {
        XPathParts::parse(&self.0)
    }

    /// Cheap textual prefix test, used by checks to reject unrelated paths early.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.0.contains(fragment)
    }

    /// Malformed paths contain nothing.
    pub fn contains_element(&self, element: &str) -> bool {
        // Skip the parse when the name cannot possibly appear
        if !self.0.contains(element) {
            return false;
        }
        self.parts()
            .map(|parts| parts.contains_element(element))
            .unwrap_or(false)
    }

    pub fn find_attribute_value(&self, element: &str, attribute: &str) -> Option<String> {
        self.parts()
            .ok()?
            .find_attribute_value(element, attribute)
            .map(str::to_string)
    }

    /// Name of the final element, e.g. `standard` for a metazone name path.
    pub fn last_element(&self) -> Option<String> {
        self.parts()
            .ok()?
            .elements
            .last()
            .map(|element| element.name.clone())
    }

    /// The `draft` attribute of the final element, or [`DEFAULT_DRAFT`].
    pub fn draft_status(&self) -> String {
        self.parts()
            .ok()
            .and_then(|parts| {
                parts
                    .elements
                    .last()
                    .and_then(|element| element.attribute("draft"))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_DRAFT.to_string())
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XPath({})", self.0)
    }
}

impl From<&str> for XPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for XPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl AsRef<str> for XPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }
}

/// A parsed path: `//ldml/dates/timeZoneNames/metazone[@type="Alaska"]/long/standard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathParts {
    pub elements: Vec<Element>,
}

impl XPathParts {
    pub fn parse(path: &str) -> Result<Self, LoadError> {
        let malformed = || LoadError::MalformedPath(path.to_string());
        let body = path.strip_prefix("//").ok_or_else(malformed)?;

        let elements = split_segments(body)
            .ok_or_else(malformed)?
            .into_iter()
            .map(parse_element)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(malformed)?;

        Ok(Self { elements })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains_element(&self, name: &str) -> bool {
        self.elements.iter().any(|element| element.name == name)
    }

    /// Value of `attribute` on the first element called `element` that has it.
    pub fn find_attribute_value(&self, element: &str, attribute: &str) -> Option<&str> {
        self.elements
            .iter()
            .filter(|e| e.name == element)
            .find_map(|e| e.attribute(attribute))
    }

    /// Sets `attribute` on the last element called `element`. Returns false if
    /// there is no such element.
    pub fn set_attribute(&mut self, element: &str, attribute: &str, value: &str) -> bool {
        match self.elements.iter_mut().rev().find(|e| e.name == element) {
            Some(e) => {
                e.set_attribute(attribute, value);
                true
            }
            None => false,
        }
    }

    /// Removes `attribute` from the last element called `element`.
    pub fn remove_attribute(&mut self, element: &str, attribute: &str) {
        if let Some(e) = self.elements.iter_mut().rev().find(|e| e.name == element) {
            e.remove_attribute(attribute);
        }
    }

    /// Replaces the name of the final element.
    pub fn set_last_element(&mut self, name: &str) {
        if let Some(last) = self.elements.last_mut() {
            last.name = name.to_string();
        }
    }

    pub fn to_xpath(&self) -> XPath {
        XPath::new(self.to_string())
    }
}

impl fmt::Display for XPathParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for element in &self.elements {
            write!(f, "/{}", element.name)?;
            for (key, value) in &element.attributes {
                write!(f, "[@{key}=\"{value}\"]")?;
            }
        }
        Ok(())
    }
}

/// Splits on `/` outside of attribute brackets.
fn split_segments(body: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_quote = false;

    for (i, c) in body.char_indices() {
        match c {
            '"' if depth > 0 => in_quote = !in_quote,
            '[' if !in_quote => depth += 1,
            ']' if !in_quote => depth = depth.checked_sub(1)?,
            '/' if depth == 0 => {
                segments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || in_quote {
        return None;
    }
    segments.push(&body[start..]);

    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

fn parse_element(segment: &str) -> Option<Element> {
    let (name, mut rest) = match segment.find('[') {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };
    if name.is_empty() {
        return None;
    }

    let mut attributes = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix("[@")?;
        let eq = inner.find("=\"")?;
        let key = &inner[..eq];
        let after = &inner[eq + 2..];
        let close = after.find("\"]")?;
        attributes.push((key.to_string(), after[..close].to_string()));
        rest = &after[close + 2..];
    }

    Some(Element {
        name: name.to_string(),
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str =
        r#"//ldml/dates/timeZoneNames/metazone[@type="Alaska"]/long/standard[@draft="contributed"]"#;

    #[test]
    fn test_parse_and_display() {
        let parts = XPathParts::parse(ZONE).unwrap();
        assert_eq!(parts.len(), 6);
        assert_eq!(parts.elements[3].name, "metazone");
        assert_eq!(parts.to_string(), ZONE);
    }

    #[test]
    fn test_attribute_queries() {
        let path = XPath::from(ZONE);
        assert!(path.contains_element("metazone"));
        assert!(!path.contains_element("zone"));
        assert_eq!(
            path.find_attribute_value("metazone", "type").as_deref(),
            Some("Alaska")
        );
        assert_eq!(path.find_attribute_value("long", "type"), None);
        assert_eq!(path.last_element().as_deref(), Some("standard"));
        assert_eq!(path.draft_status(), "contributed");
    }

    #[test]
    fn test_default_draft_status() {
        let path = XPath::from("//ldml/localeDisplayNames/languages/language[@type=\"fr\"]");
        assert_eq!(path.draft_status(), DEFAULT_DRAFT);
    }

    #[test]
    fn test_slash_inside_attribute_value() {
        let parts = XPathParts::parse(r#"//ldml/units/unit[@type="a/b"]/displayName"#).unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts.find_attribute_value("unit", "type"), Some("a/b"));
    }

    #[test]
    fn test_set_attribute() {
        let mut parts =
            XPathParts::parse(r#"//ldml/dates/days/dayWidth[@type="wide"]/day[@type="sun"]"#)
                .unwrap();
        assert!(parts.set_attribute("day", "type", "mon"));
        assert!(!parts.set_attribute("month", "type", "1"));
        assert_eq!(
            parts.to_string(),
            r#"//ldml/dates/days/dayWidth[@type="wide"]/day[@type="mon"]"#
        );

        parts.set_attribute("day", "alt", "variant");
        parts.remove_attribute("day", "alt");
        parts.remove_attribute("month", "type");
        assert_eq!(
            parts.to_string(),
            r#"//ldml/dates/days/dayWidth[@type="wide"]/day[@type="mon"]"#
        );
    }

    #[test]
    fn test_malformed_paths() {
        assert!(XPathParts::parse("ldml/identity").is_err());
        assert!(XPathParts::parse("//ldml//identity").is_err());
        assert!(XPathParts::parse(r#"//ldml/a[@type="x"/b"#).is_err());
        assert!(!XPath::from("not a path").contains_element("path"));
    }
}
