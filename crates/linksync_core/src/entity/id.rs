//! Entity identifier.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of one logical record across all components.
///
/// Identifiers are:
/// - Stable for the lifetime of the record
/// - Derived once per distinct source primary key
/// - Never reused
///
/// Translating between identifiers and storage-specific keys is the
/// responsibility of the gateway.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier from its token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the token.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Identifier {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn from_str_roundtrip() {
        let id = Identifier::from("a1b2");
        assert_eq!(id.as_str(), "a1b2");
        assert_eq!(String::from(id), "a1b2");
    }

    #[test]
    fn display_and_debug() {
        let id = Identifier::new("42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "Identifier(42)");
    }

    #[test]
    fn lookup_by_str() {
        let ids: BTreeSet<Identifier> = ["1", "2"].into_iter().map(Identifier::from).collect();
        assert!(ids.contains("1"));
        assert!(!ids.contains("3"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Identifier::from("x")).unwrap();
        assert_eq!(json, "\"x\"");
    }
}
