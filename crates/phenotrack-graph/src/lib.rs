//! Phenotrack Graph Model
//!
//! Triple graphs and identifiers shared by the resolver and the sync engine.
//!
//! # Core Concepts
//!
//! - [`Iri`], [`Literal`], [`Term`]: immutable, cheaply cloned RDF terms
//! - [`Graph`]: insertion-ordered triple set ("stored order")
//! - [`ResolvedId`]: canonical or provisional (`urn:temp:uuid:`) identifier
//! - [`ArtifactId`]: persisted artifact, the unit change-sets are keyed by
//! - [`NaturalKey`]: trimmed user-supplied key (barcode, composed name)
//!
//! # Example
//!
//! ```rust,ignore
//! use phenotrack_graph::{vocab, EntityKind, Graph, Literal, ResolvedId};
//!
//! let tray = ResolvedId::mint(EntityKind::Tray);
//! let mut graph = Graph::new();
//! graph.add(&tray, &vocab::RDF_TYPE, &*vocab::TRAY);
//! graph.add(&tray, &vocab::HAS_BARCODE, Literal::plain("TRAY-01"));
//!
//! let json = phenotrack_graph::rdf_json::to_string(&graph)?;
//! ```

mod error;
mod graph;
mod ids;
mod term;

pub mod rdf_json;
pub mod vocab;

pub use error::GraphError;
pub use graph::{Graph, Triple};
pub use ids::{ArtifactId, EntityKind, NaturalKey, ResolvedId, PROVISIONAL_PREFIX};
pub use term::{Iri, Literal, Term};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
