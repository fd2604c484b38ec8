//! Typed warnings collected during a run
//!
//! Recoverable anomalies are recorded here as well as logged, so callers
//! and tests can inspect them without scraping log output.

use parking_lot::Mutex;
use phenotrack_graph::{ArtifactId, EntityKind, NaturalKey, ResolvedId};
use std::fmt::{self, Display, Formatter};

/// Why a candidate was left out of the bulk pre-population
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Artifact names no top-level object
    NoTopObject,
    /// Artifact names more than one top-level object
    MultipleProjects,
    /// Subject is a blank node, not an IRI
    NotAnIri,
    /// Subject has no label
    NoLabel,
    /// Label is not a literal
    NonLiteralLabel,
    /// Label does not match the expected pattern
    MalformedLabel(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTopObject => f.write_str("no top object"),
            Self::MultipleProjects => f.write_str("more than one top object"),
            Self::NotAnIri => f.write_str("subject is not an IRI"),
            Self::NoLabel => f.write_str("no label"),
            Self::NonLiteralLabel => f.write_str("label is not a literal"),
            Self::MalformedLabel(label) => write!(f, "label {label:?} does not match pattern"),
        }
    }
}

/// Recoverable anomaly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Two entities claimed the same natural key; the first was kept
    DuplicateCanonicalKey {
        /// Entity kind
        kind: EntityKind,
        /// Contested key
        key: NaturalKey,
        /// Identifier that stayed registered
        kept: ResolvedId,
        /// Identifier that was discarded
        rejected: ResolvedId,
    },

    /// One entity was registered under two different keys
    ConflictingKeys {
        /// Entity kind
        kind: EntityKind,
        /// The entity
        id: ResolvedId,
        /// Key seen first
        first: NaturalKey,
        /// Key seen later
        second: NaturalKey,
    },

    /// Remote lookup matched several entities; the first in stored order won
    AmbiguousMatch {
        /// Entity kind
        kind: EntityKind,
        /// Key looked up
        key: NaturalKey,
        /// Number of matches
        candidates: usize,
        /// Identifier chosen
        chosen: ResolvedId,
    },

    /// Row length differed from header length
    FieldCountMismatch {
        /// 1-based data row number
        row: usize,
        /// Header count
        expected: usize,
        /// Field count
        found: usize,
    },

    /// Artifact left out of the bulk pre-population
    SkippedArtifact {
        /// The artifact
        artifact: ArtifactId,
        /// Why
        reason: SkipReason,
    },

    /// Entity inside an artifact left out of the bulk pre-population
    SkippedEntity {
        /// Entity kind
        kind: EntityKind,
        /// Subject as written in the graph
        subject: String,
        /// Why
        reason: SkipReason,
    },

    /// Control column held something other than yes/no/unknown
    UnrecognisedControl {
        /// Raw value
        value: String,
    },

    /// Line number mapped twice in the line mapping table
    DuplicateLineMapping {
        /// Line number
        line_number: String,
        /// Name kept
        kept: String,
        /// Name ignored
        rejected: String,
    },

    /// Append returned the same artifact version it was given
    UnchangedAppend {
        /// The artifact
        artifact: ArtifactId,
    },
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCanonicalKey {
                kind,
                key,
                kept,
                rejected,
            } => write!(f, "duplicate {kind} key {key:?}: kept {kept}, ignored {rejected}"),
            Self::ConflictingKeys {
                kind,
                id,
                first,
                second,
            } => write!(f, "{kind} {id} registered as both {first:?} and {second:?}"),
            Self::AmbiguousMatch {
                kind,
                key,
                candidates,
                chosen,
            } => write!(f, "{candidates} {kind} matches for {key:?}, using {chosen}"),
            Self::FieldCountMismatch {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} fields, header has {expected}"),
            Self::SkippedArtifact { artifact, reason } => {
                write!(f, "skipped artifact {artifact}: {reason}")
            }
            Self::SkippedEntity {
                kind,
                subject,
                reason,
            } => write!(f, "skipped {kind} {subject}: {reason}"),
            Self::UnrecognisedControl { value } => {
                write!(f, "unrecognised control value {value:?}, using Unknown")
            }
            Self::DuplicateLineMapping {
                line_number,
                kept,
                rejected,
            } => write!(f, "line {line_number} mapped to {kept:?}, ignored {rejected:?}"),
            Self::UnchangedAppend { artifact } => {
                write!(f, "append to {artifact} returned the same version")
            }
        }
    }
}

/// Append-only warning log shared across a run
#[derive(Debug, Default)]
pub struct Diagnostics {
    inner: Mutex<Vec<Warning>>,
}

impl Diagnostics {
    /// Empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a warning
    pub fn warn(&self, warning: Warning) {
        tracing::warn!("{warning}");
        self.inner.lock().push(warning);
    }

    /// Copy of every warning so far, in arrival order
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.inner.lock().clone()
    }

    /// Count warnings matching a predicate
    pub fn count(&self, pred: impl Fn(&Warning) -> bool) -> usize {
        self.inner.lock().iter().filter(|w| pred(w)).count()
    }

    /// Number of warnings
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.inner.lock())
    }
}
