//! Identifiers for entities, artifacts and natural keys

use crate::error::GraphError;
use crate::term::{Iri, Term};
use crate::vocab;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Reserved prefix marking identifiers minted locally during a run
pub const PROVISIONAL_PREFIX: &str = "urn:temp:uuid:";

/// Kind of entity in the project hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Top-level project (one persisted artifact each)
    Project,
    /// Experiment inside a project
    Experiment,
    /// Tray of pots
    Tray,
    /// Single pot
    Pot,
    /// Plant genotype, scoped to a project
    Genotype,
    /// Material planted in a pot
    Material,
}

impl EntityKind {
    /// All kinds, outermost first
    pub const ALL: [Self; 6] = [
        Self::Project,
        Self::Experiment,
        Self::Tray,
        Self::Pot,
        Self::Genotype,
        Self::Material,
    ];

    /// Ontology class for this kind
    #[must_use]
    pub fn type_iri(self) -> &'static Iri {
        match self {
            Self::Project => &vocab::PROJECT,
            Self::Experiment => &vocab::EXPERIMENT,
            Self::Tray => &vocab::TRAY,
            Self::Pot => &vocab::POT,
            Self::Genotype => &vocab::GENOTYPE,
            Self::Material => &vocab::MATERIAL,
        }
    }

    /// Lowercase name used inside provisional identifiers
    #[inline]
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Experiment => "experiment",
            Self::Tray => "tray",
            Self::Pot => "pot",
            Self::Genotype => "genotype",
            Self::Material => "material",
        }
    }

    /// Whether a natural key of this kind is only unique within an owning scope
    #[inline]
    #[must_use]
    pub const fn requires_scope(self) -> bool {
        !matches!(self, Self::Project | Self::Experiment)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Identifier an entity resolved to: canonical or provisional
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedId(Iri);

impl ResolvedId {
    /// Wrap an identifier discovered remotely
    #[inline]
    #[must_use]
    pub fn canonical(iri: Iri) -> Self {
        Self(iri)
    }

    /// Mint a fresh provisional identifier for `kind`
    #[must_use]
    pub fn mint(kind: EntityKind) -> Self {
        Self::mint_inner(kind, None)
    }

    /// Mint a provisional identifier carrying a readable segment
    /// (`urn:temp:uuid:genotype:<segment>:<uuid>`)
    #[must_use]
    pub fn mint_with(kind: EntityKind, segment: &str) -> Self {
        Self::mint_inner(kind, Some(segment))
    }

    fn mint_inner(kind: EntityKind, segment: Option<&str>) -> Self {
        let uuid = Uuid::new_v4();
        let text = match segment.map(str::trim).filter(|s| !s.is_empty()) {
            // Whitespace would make the IRI invalid
            Some(seg) => format!(
                "{PROVISIONAL_PREFIX}{}:{}:{uuid}",
                kind.slug(),
                seg.replace(char::is_whitespace, "_")
            ),
            None => format!("{PROVISIONAL_PREFIX}{}:{uuid}", kind.slug()),
        };
        Self(Iri::from_trusted(&text))
    }

    /// True if minted locally and not yet persisted
    #[inline]
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    /// Borrow as an IRI
    #[inline]
    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.0
    }

    /// Graph node for this identifier
    #[inline]
    #[must_use]
    pub fn term(&self) -> Term {
        Term::Iri(self.0.clone())
    }
}

impl Display for ResolvedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<ResolvedId> for Term {
    fn from(id: ResolvedId) -> Self {
        Term::Iri(id.0)
    }
}

impl From<&ResolvedId> for Term {
    fn from(id: &ResolvedId) -> Self {
        id.term()
    }
}

/// Persisted artifact: ontology IRI plus version IRI
///
/// Each project lives in one artifact, so this doubles as the owning unit
/// that change-sets are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    ontology: Iri,
    version: Iri,
}

impl ArtifactId {
    /// Create from ontology and version IRIs
    #[inline]
    #[must_use]
    pub fn new(ontology: Iri, version: Iri) -> Self {
        Self { ontology, version }
    }

    /// Ontology IRI
    #[inline]
    #[must_use]
    pub fn ontology(&self) -> &Iri {
        &self.ontology
    }

    /// Version IRI
    #[inline]
    #[must_use]
    pub fn version(&self) -> &Iri {
        &self.version
    }
}

impl Display for ArtifactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (version {})", self.ontology, self.version)
    }
}

/// Natural key from user input, trimmed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalKey(Arc<str>);

impl NaturalKey {
    /// Separator used by [`NaturalKey::composed`]
    pub const SEPARATOR: char = '|';

    /// Build a key from raw input, trimming surrounding whitespace
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(raw.as_ref().trim()))
    }

    /// Key composed of several trimmed parts, e.g. genus, species and line
    #[must_use]
    pub fn composed(parts: &[&str]) -> Self {
        let joined = parts
            .iter()
            .map(|p| p.trim())
            .collect::<Vec<_>>()
            .join(&Self::SEPARATOR.to_string());
        Self(Arc::from(joined.as_str()))
    }

    /// Key text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if nothing was left after trimming
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for NaturalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NaturalKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl TryFrom<&str> for ResolvedId {
    type Error = GraphError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Iri::new(value).map(Self)
    }
}
