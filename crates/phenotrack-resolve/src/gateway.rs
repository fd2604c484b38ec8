//! Remote graph service seams
//!
//! The resolver never talks to the graph database directly. It issues
//! pattern queries scoped to one artifact through [`QueryGateway`] and hands
//! finished change-sets to [`AppendGateway`].

use crate::error::GatewayError;
use async_trait::async_trait;
use phenotrack_graph::{ArtifactId, Graph, Iri};
use std::fmt::{self, Display, Formatter};

/// Query shapes the resolver needs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryPattern {
    /// Every entity of a type with its label:
    /// `?s rdf:type <class> ; rdfs:label ?label`
    ByType {
        /// Class IRI
        class: Iri,
    },

    /// Entities of a type whose label starts with a prefix
    ByTypeLabelPrefix {
        /// Class IRI
        class: Iri,
        /// Label prefix
        prefix: String,
    },

    /// Entities of a type with every property they carry
    ByTypeAllProperties {
        /// Class IRI
        class: Iri,
    },
}

impl QueryPattern {
    /// Class the pattern selects
    #[inline]
    #[must_use]
    pub fn class(&self) -> &Iri {
        match self {
            Self::ByType { class }
            | Self::ByTypeLabelPrefix { class, .. }
            | Self::ByTypeAllProperties { class } => class,
        }
    }
}

impl Display for QueryPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByType { class } => write!(f, "by-type {class}"),
            Self::ByTypeLabelPrefix { class, prefix } => {
                write!(f, "by-type {class} label-prefix {prefix:?}")
            }
            Self::ByTypeAllProperties { class } => write!(f, "by-type-all {class}"),
        }
    }
}

/// Read side of the remote graph service
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Every unpublished artifact, described as `owl:Ontology` subjects
    /// with `owl:versionIRI` and top-object links. Each top object also
    /// carries its `rdf:type` and `rdfs:label`.
    async fn list_unpublished(&self) -> Result<Graph, GatewayError>;

    /// Run a pattern query inside one artifact
    async fn query(&self, pattern: &QueryPattern, artifact: &ArtifactId)
        -> Result<Graph, GatewayError>;
}

/// Write side of the remote graph service
#[async_trait]
pub trait AppendGateway: Send + Sync {
    /// Append `graph` to `artifact`, returning the artifact's new version
    async fn append(&self, artifact: &ArtifactId, graph: &Graph)
        -> Result<ArtifactId, GatewayError>;
}
