//! RDF terms: IRIs, blank nodes and literals
//!
//! All terms are immutable and cheap to clone (`Arc<str>` backed), so the
//! same IRI can be shared between caches, change-sets and queries without
//! copying the underlying text.

use crate::error::GraphError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// An absolute IRI
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Parse and validate an IRI
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidIri`] if the text is empty, contains
    /// whitespace or has no scheme separator.
    pub fn new(value: impl AsRef<str>) -> Result<Self, GraphError> {
        let value = value.as_ref();
        if value.is_empty() {
            return Err(GraphError::invalid_iri(value, "empty"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(GraphError::invalid_iri(value, "contains whitespace"));
        }
        match value.find(':') {
            Some(idx) if idx > 0 => Ok(Self(Arc::from(value))),
            _ => Err(GraphError::invalid_iri(value, "missing scheme")),
        }
    }

    /// Build an IRI from a trusted constant
    #[inline]
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        Self(Arc::from(value))
    }

    /// Build an IRI from text assembled out of already-valid parts
    pub(crate) fn from_trusted(value: &str) -> Self {
        debug_assert!(Self::new(value).is_ok(), "invalid IRI {value:?}");
        Self(Arc::from(value))
    }

    /// Borrow the IRI text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the IRI text starts with `prefix`
    #[inline]
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Iri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Iri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// A literal value with optional datatype or language tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Option<Iri>,
    language: Option<Arc<str>>,
}

impl Literal {
    /// Plain literal
    #[inline]
    #[must_use]
    pub fn plain(lexical: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: None,
            language: None,
        }
    }

    /// Typed literal
    #[inline]
    #[must_use]
    pub fn typed(lexical: impl AsRef<str>, datatype: Iri) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Some(datatype),
            language: None,
        }
    }

    /// Language-tagged literal
    #[inline]
    #[must_use]
    pub fn with_language(lexical: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: None,
            language: Some(Arc::from(language.as_ref())),
        }
    }

    /// `xsd:string` literal
    #[inline]
    #[must_use]
    pub fn string(lexical: impl AsRef<str>) -> Self {
        Self::typed(lexical, crate::vocab::XSD_STRING.clone())
    }

    /// Lexical form
    #[inline]
    #[must_use]
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// Datatype IRI, if any
    #[inline]
    #[must_use]
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    /// Language tag, if any
    #[inline]
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lexical.as_ref())?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")?;
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^{dt:?}")?;
        }
        Ok(())
    }
}

/// Any node that can appear in a triple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// Named node
    Iri(Iri),
    /// Blank node with a document-local label
    Blank(Arc<str>),
    /// Literal value
    Literal(Literal),
}

impl Term {
    /// Blank node
    #[inline]
    #[must_use]
    pub fn blank(label: impl AsRef<str>) -> Self {
        Self::Blank(Arc::from(label.as_ref()))
    }

    /// IRI if this is a named node
    #[inline]
    #[must_use]
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Literal if this is a literal
    #[inline]
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Is this a blank node
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "{iri:?}"),
            Self::Blank(label) => write!(f, "_:{label}"),
            Self::Literal(lit) => Display::fmt(lit, f),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<&Iri> for Term {
    fn from(iri: &Iri) -> Self {
        Self::Iri(iri.clone())
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_validation() {
        assert!(Iri::new("http://example.org/a").is_ok());
        assert!(Iri::new("urn:temp:uuid:tray:1").is_ok());
        assert!(Iri::new("").is_err());
        assert!(Iri::new("no scheme").is_err());
        assert!(Iri::new("noscheme").is_err());
        assert!(Iri::new(":x").is_err());
    }

    #[test]
    fn iri_serde_round_trip() {
        let iri = Iri::new("http://example.org/a").unwrap();
        let json = serde_json::to_string(&iri).unwrap();
        assert_eq!(json, "\"http://example.org/a\"");
        let back: Iri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, iri);
        assert!(serde_json::from_str::<Iri>("\"bad iri\"").is_err());
    }

    #[test]
    fn literal_equality_includes_datatype() {
        assert_ne!(Literal::plain("1"), Literal::string("1"));
        assert_eq!(Literal::string("1"), Literal::string("1"));
        assert_eq!(Literal::string("1").lexical(), "1");
    }

    #[test]
    fn term_accessors() {
        let iri = Iri::from_static("http://example.org/x");
        let term = Term::from(&iri);
        assert_eq!(term.as_iri(), Some(&iri));
        assert!(term.as_literal().is_none());
        assert!(Term::blank("b0").is_blank());
        assert_eq!(Term::blank("b0").to_string(), "_:b0");
    }
}
