//! Qualified names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A namespace-qualified name, optionally carrying the prefix it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI; `None` for names in no namespace.
    #[serde(rename = "nsURI", default, skip_serializing_if = "Option::is_none")]
    pub ns_uri: Option<String>,

    /// Local name.
    pub name: String,

    /// Prefix used in the source document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl QName {
    /// Create a qualified name without prefix.
    #[must_use]
    pub fn new(ns_uri: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            ns_uri: ns_uri.map(String::from),
            name: name.into(),
            prefix: None,
        }
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(String::from);
        self
    }

    /// Namespace URI as a string slice.
    #[must_use]
    pub fn ns(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }

    /// Check namespace and local name, ignoring the prefix.
    #[must_use]
    pub fn matches(&self, ns_uri: Option<&str>, name: &str) -> bool {
        self.ns() == ns_uri && self.name == name
    }

    /// Lookup key ignoring the prefix.
    #[must_use]
    pub fn key(&self) -> (Option<String>, String) {
        (self.ns_uri.clone(), self.name.clone())
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns_uri {
            Some(ns) => write!(f, "{{{ns}}}{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Split a prefixed name (`tns:Foo`) into prefix and local part.
///
/// # Examples
/// ```
/// use wsdl_descriptors::qname::split_prefixed;
///
/// assert_eq!(split_prefixed("tns:Foo"), (Some("tns"), "Foo"));
/// assert_eq!(split_prefixed("Foo"), (None, "Foo"));
/// ```
pub fn split_prefixed(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let q = QName::new(Some("urn:a"), "Add");
        assert_eq!(q.to_string(), "{urn:a}Add");
        assert_eq!(QName::new(None, "x").to_string(), "x");
    }

    #[test]
    fn test_matches_ignores_prefix() {
        let q = QName::new(Some("urn:a"), "Add").with_prefix(Some("tns"));
        assert!(q.matches(Some("urn:a"), "Add"));
        assert!(!q.matches(None, "Add"));
    }

    #[test]
    fn test_empty_prefix_is_dropped() {
        let q = QName::new(None, "x").with_prefix(Some(""));
        assert!(q.prefix.is_none());
    }

    #[test]
    fn test_serialize_omits_absent_parts() {
        let q = QName::new(None, "x");
        assert_eq!(serde_json::to_string(&q).unwrap(), r#"{"name":"x"}"#);
        let q = QName::new(Some("urn:a"), "y").with_prefix(Some("a"));
        assert_eq!(
            serde_json::to_string(&q).unwrap(),
            r#"{"nsURI":"urn:a","name":"y","prefix":"a"}"#
        );
    }
}
