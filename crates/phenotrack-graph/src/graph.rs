//! Insertion-ordered triple graph
//!
//! [`Graph`] keeps triples in the order they were first added. That order is
//! the "stored order" used whenever a query yields several candidates and
//! the first one has to be picked deterministically.

use crate::term::{Iri, Literal, Term};
use crate::vocab;
use indexmap::IndexSet;
use std::fmt::{self, Display, Formatter};

/// A single statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    /// Subject (IRI or blank node)
    pub subject: Term,
    /// Predicate
    pub predicate: Iri,
    /// Object
    pub object: Term,
}

impl Triple {
    /// Build a triple
    #[inline]
    #[must_use]
    pub fn new(subject: impl Into<Term>, predicate: &Iri, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.clone(),
            object: object.into(),
        }
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {} .", self.subject, self.predicate, self.object)
    }
}

/// Set of triples with stable insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: IndexSet<Triple>,
}

impl Graph {
    /// Empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statement, returning `false` if it was already present
    pub fn add(&mut self, subject: impl Into<Term>, predicate: &Iri, object: impl Into<Term>) -> bool {
        self.triples.insert(Triple::new(subject, predicate, object))
    }

    /// Insert a prebuilt triple
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Append every triple of `other`, keeping our order first
    pub fn merge(&mut self, other: &Graph) {
        self.triples.extend(other.triples.iter().cloned());
    }

    /// Membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Number of triples
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True if the graph holds no triples
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate in stored order
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching a pattern; `None` is a wildcard
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Iri>,
        object: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| {
            subject.map_or(true, |s| &t.subject == s)
                && predicate.map_or(true, |p| &t.predicate == p)
                && object.map_or(true, |o| &t.object == o)
        })
    }

    /// Distinct subjects typed as `class`, in stored order
    #[must_use]
    pub fn subjects_of_type(&self, class: &Iri) -> Vec<Term> {
        let class = Term::from(class);
        let mut seen = IndexSet::new();
        for t in self.matching(None, Some(&*vocab::RDF_TYPE), Some(&class)) {
            seen.insert(t.subject.clone());
        }
        seen.into_iter().collect()
    }

    /// Objects of `subject predicate ?o`, in stored order
    #[must_use]
    pub fn objects<'a>(&'a self, subject: &'a Term, predicate: &'a Iri) -> Vec<&'a Term> {
        self.matching(Some(subject), Some(predicate), None)
            .map(|t| &t.object)
            .collect()
    }

    /// Literal objects of `subject predicate ?o`
    #[must_use]
    pub fn literals<'a>(&'a self, subject: &'a Term, predicate: &'a Iri) -> Vec<&'a Literal> {
        self.objects(subject, predicate)
            .into_iter()
            .filter_map(Term::as_literal)
            .collect()
    }

    /// Check for `subject predicate "lexical"` regardless of datatype
    #[must_use]
    pub fn has_literal(&self, subject: &Term, predicate: &Iri, lexical: &str) -> bool {
        self.literals(subject, predicate)
            .iter()
            .any(|lit| lit.lexical() == lexical)
    }

    /// Every triple whose subject is `subject`
    #[must_use]
    pub fn subject_graph(&self, subject: &Term) -> Graph {
        self.matching(Some(subject), None, None).cloned().collect()
    }

    /// Distinct subjects in stored order
    #[must_use]
    pub fn subjects(&self) -> Vec<Term> {
        let mut seen = IndexSet::new();
        for t in &self.triples {
            seen.insert(t.subject.clone());
        }
        seen.into_iter().collect()
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl IntoIterator for Graph {
    type Item = Triple;
    type IntoIter = indexmap::set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = indexmap::set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}
