//! Identity cache: natural key to resolved identifier, once per run
//!
//! Resolution order for a key:
//! 1. cache hit, no I/O;
//! 2. remote probe inside the owning artifact (zero matches mints a
//!    provisional identifier, one match is canonical, several warn and
//!    take the first in stored order);
//! 3. insert-if-absent, where a concurrent winner's record replaces ours.

use crate::cache::{CacheStats, RunCache};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ResolveError;
use crate::gateway::{QueryGateway, QueryPattern};
use dashmap::DashMap;
use phenotrack_graph::{vocab, ArtifactId, EntityKind, Graph, Iri, NaturalKey, ResolvedId, Term};
use std::sync::Arc;

/// Cache key: a natural key is only unique within its kind and scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    /// Entity kind
    pub kind: EntityKind,
    /// Natural key
    pub key: NaturalKey,
    /// Owning scope, if the kind needs one
    pub scope: Option<ResolvedId>,
}

/// Resolved entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// Entity kind
    pub kind: EntityKind,
    /// Natural key it was resolved from
    pub key: NaturalKey,
    /// Resolved identifier
    pub id: ResolvedId,
    /// Owning parent entity
    pub parent: Option<ResolvedId>,
    /// Artifact holding the entity
    pub artifact: Option<ArtifactId>,
    /// Full description; empty unless provisional
    pub description: Graph,
}

impl EntityRecord {
    /// Record for an entity that already exists remotely
    #[must_use]
    pub fn canonical(kind: EntityKind, key: NaturalKey, id: ResolvedId) -> Self {
        Self {
            kind,
            key,
            id,
            parent: None,
            artifact: None,
            description: Graph::new(),
        }
    }

    /// Set the parent
    #[must_use]
    pub fn with_parent(mut self, parent: Option<ResolvedId>) -> Self {
        self.parent = parent;
        self
    }

    /// Set the owning artifact
    #[must_use]
    pub fn with_artifact(mut self, artifact: Option<ArtifactId>) -> Self {
        self.artifact = artifact;
        self
    }

    /// True if the identifier was minted this run
    #[inline]
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

/// A freshly minted identifier with the triples describing it
#[derive(Debug, Clone)]
pub struct Minted {
    /// Provisional identifier
    pub id: ResolvedId,
    /// Describing triples
    pub description: Graph,
}

impl Minted {
    /// Bundle an identifier and its description
    #[inline]
    #[must_use]
    pub fn new(id: ResolvedId, description: Graph) -> Self {
        Self { id, description }
    }
}

/// How candidates are picked out of a probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every subject typed with the query's class
    TypedSubjects,
    /// Typed subjects whose label, or its first word, equals this key
    Label(String),
    /// Typed subjects carrying all of these literal property values
    Properties(Vec<(Iri, String)>),
    /// Candidates of the first selector that finds any
    FirstOf(Vec<Selector>),
}

impl Selector {
    fn select(&self, graph: &Graph, class: &Iri) -> Vec<Iri> {
        if let Self::FirstOf(selectors) = self {
            return selectors
                .iter()
                .map(|s| s.select(graph, class))
                .find(|candidates| !candidates.is_empty())
                .unwrap_or_default();
        }
        graph
            .subjects_of_type(class)
            .into_iter()
            .filter(|subject| self.accepts(graph, subject))
            .filter_map(|subject| subject.as_iri().cloned())
            .collect()
    }

    fn accepts(&self, graph: &Graph, subject: &Term) -> bool {
        match self {
            Self::TypedSubjects => true,
            Self::Label(key) => graph
                .literals(subject, &vocab::RDFS_LABEL)
                .iter()
                .any(|label| label_matches(label.lexical(), key)),
            Self::Properties(props) => props
                .iter()
                .all(|(pred, value)| graph.has_literal(subject, pred, value)),
            Self::FirstOf(selectors) => selectors.iter().any(|s| s.accepts(graph, subject)),
        }
    }
}

/// `TRAY-01` matches `TRAY-01` and `TRAY-01 spare`, never `TRAY-010`
fn label_matches(label: &str, key: &str) -> bool {
    let label = label.trim();
    label == key || label.split_whitespace().next() == Some(key)
}

/// Remote lookup performed on a cache miss
#[derive(Debug, Clone)]
pub enum Probe {
    /// Query the artifact and select candidates
    Remote {
        /// Query to run
        pattern: QueryPattern,
        /// Artifact to run it in
        artifact: ArtifactId,
        /// Candidate selection
        selector: Selector,
    },
    /// Always mint on a miss
    Skip,
}

/// Everything needed to resolve one natural key
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Entity kind
    pub kind: EntityKind,
    /// Natural key
    pub key: NaturalKey,
    /// Owning scope
    pub scope: Option<ResolvedId>,
    /// Parent to record on the entity
    pub parent: Option<ResolvedId>,
    /// Artifact the entity belongs to
    pub artifact: Option<ArtifactId>,
    /// Lookup on a miss
    pub probe: Probe,
}

impl ResolveRequest {
    /// Request with no scope, parent or probe
    #[must_use]
    pub fn new(kind: EntityKind, key: NaturalKey) -> Self {
        Self {
            kind,
            key,
            scope: None,
            parent: None,
            artifact: None,
            probe: Probe::Skip,
        }
    }

    /// Set the owning scope
    #[must_use]
    pub fn scoped(mut self, scope: &ResolvedId) -> Self {
        self.scope = Some(scope.clone());
        self
    }

    /// Set the parent
    #[must_use]
    pub fn with_parent(mut self, parent: &ResolvedId) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Set the artifact
    #[must_use]
    pub fn in_artifact(mut self, artifact: &ArtifactId) -> Self {
        self.artifact = Some(artifact.clone());
        self
    }

    /// Probe the artifact with a label-prefix query on a miss
    ///
    /// The query only narrows the search; a candidate must carry the key as
    /// its whole label or as the label's first word.
    #[must_use]
    pub fn probe_label(mut self, artifact: &ArtifactId) -> Self {
        self.probe = Probe::Remote {
            pattern: QueryPattern::ByTypeLabelPrefix {
                class: self.kind.type_iri().clone(),
                prefix: self.key.as_str().to_string(),
            },
            artifact: artifact.clone(),
            selector: Selector::Label(self.key.as_str().to_string()),
        };
        self
    }

    /// Probe the artifact for an entity whose barcode is the key, falling
    /// back to one labelled with it
    #[must_use]
    pub fn probe_barcode(mut self, artifact: &ArtifactId) -> Self {
        let key = self.key.as_str().to_string();
        self.probe = Probe::Remote {
            pattern: QueryPattern::ByTypeAllProperties {
                class: self.kind.type_iri().clone(),
            },
            artifact: artifact.clone(),
            selector: Selector::FirstOf(vec![
                Selector::Properties(vec![(vocab::HAS_BARCODE.clone(), key.clone())]),
                Selector::Label(key),
            ]),
        };
        self
    }

    /// Probe the artifact for entities carrying these literal properties
    #[must_use]
    pub fn probe_properties(mut self, artifact: &ArtifactId, props: Vec<(Iri, String)>) -> Self {
        self.probe = Probe::Remote {
            pattern: QueryPattern::ByTypeAllProperties {
                class: self.kind.type_iri().clone(),
            },
            artifact: artifact.clone(),
            selector: Selector::Properties(props),
        };
        self
    }

    fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            kind: self.kind,
            key: self.key.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Run-scoped identity cache shared by all row resolvers
#[derive(Debug)]
pub struct IdentityCache {
    entries: RunCache<IdentityKey, Arc<EntityRecord>>,
    keys_by_id: DashMap<(EntityKind, ResolvedId), NaturalKey>,
    diagnostics: Arc<Diagnostics>,
}

impl IdentityCache {
    /// Empty cache reporting into `diagnostics`
    #[must_use]
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            entries: RunCache::new(),
            keys_by_id: DashMap::new(),
            diagnostics,
        }
    }

    /// Cached record, no I/O
    #[must_use]
    pub fn lookup(
        &self,
        kind: EntityKind,
        key: &NaturalKey,
        scope: Option<&ResolvedId>,
    ) -> Option<Arc<EntityRecord>> {
        self.entries.get(&IdentityKey {
            kind,
            key: key.clone(),
            scope: scope.cloned(),
        })
    }

    /// Register a record discovered in bulk
    ///
    /// The first registration of a key wins. A later record for the same key
    /// raises [`Warning::DuplicateCanonicalKey`]; an entity seen under a
    /// second key raises [`Warning::ConflictingKeys`] and both keys stay.
    pub fn register(&self, record: EntityRecord, scope: Option<&ResolvedId>) -> (Arc<EntityRecord>, bool) {
        let ikey = IdentityKey {
            kind: record.kind,
            key: record.key.clone(),
            scope: scope.cloned(),
        };
        let (stored, inserted) = self.entries.publish(ikey, Arc::new(record.clone()));
        if !inserted {
            if stored.id != record.id {
                self.diagnostics.warn(Warning::DuplicateCanonicalKey {
                    kind: record.kind,
                    key: record.key,
                    kept: stored.id.clone(),
                    rejected: record.id,
                });
            }
            return (stored, false);
        }

        let existing = self
            .keys_by_id
            .entry((record.kind, record.id.clone()))
            .or_insert_with(|| record.key.clone())
            .clone();
        if existing != record.key {
            self.diagnostics.warn(Warning::ConflictingKeys {
                kind: record.kind,
                id: record.id,
                first: existing,
                second: record.key,
            });
        }
        (stored, true)
    }

    /// Resolve a key, probing remotely and minting on a miss
    ///
    /// `mint` runs only if the probe finds nothing. Its result may still be
    /// discarded if a concurrent resolver publishes first.
    ///
    /// # Errors
    /// - [`ResolveError::MissingScope`] if the kind needs a scope and none was given
    /// - [`ResolveError::Gateway`] if the probe fails
    pub async fn resolve<F>(
        &self,
        request: ResolveRequest,
        gateway: &dyn QueryGateway,
        mint: F,
    ) -> Result<Arc<EntityRecord>, ResolveError>
    where
        F: FnOnce(&NaturalKey) -> Minted + Send,
    {
        if request.kind.requires_scope() && request.scope.is_none() {
            return Err(ResolveError::MissingScope {
                kind: request.kind,
                key: request.key.to_string(),
            });
        }

        let ikey = request.identity_key();
        let (record, inserted) = self
            .entries
            .get_or_create(ikey, || self.probe_or_mint(&request, gateway, mint))
            .await?;

        if inserted {
            tracing::debug!(
                "resolved {} {:?} to {}{}",
                record.kind,
                record.key.as_str(),
                record.id,
                if record.is_provisional() { " (provisional)" } else { "" }
            );
        }
        Ok(record)
    }

    async fn probe_or_mint<F>(
        &self,
        request: &ResolveRequest,
        gateway: &dyn QueryGateway,
        mint: F,
    ) -> Result<Arc<EntityRecord>, ResolveError>
    where
        F: FnOnce(&NaturalKey) -> Minted,
    {
        let found = match &request.probe {
            Probe::Remote {
                pattern,
                artifact,
                selector,
            } => {
                let result = gateway.query(pattern, artifact).await?;
                let candidates = selector.select(&result, pattern.class());
                if candidates.len() > 1 {
                    self.diagnostics.warn(Warning::AmbiguousMatch {
                        kind: request.kind,
                        key: request.key.clone(),
                        candidates: candidates.len(),
                        chosen: ResolvedId::canonical(candidates[0].clone()),
                    });
                }
                candidates.into_iter().next()
            }
            Probe::Skip => None,
        };

        let record = match found {
            Some(iri) => EntityRecord::canonical(request.kind, request.key.clone(), ResolvedId::canonical(iri)),
            None => {
                let minted = mint(&request.key);
                EntityRecord {
                    kind: request.kind,
                    key: request.key.clone(),
                    id: minted.id,
                    parent: None,
                    artifact: None,
                    description: minted.description,
                }
            }
        };
        Ok(Arc::new(
            record
                .with_parent(request.parent.clone())
                .with_artifact(request.artifact.clone()),
        ))
    }

    /// Number of resolved keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records of one kind
    #[must_use]
    pub fn records(&self, kind: EntityKind) -> Vec<Arc<EntityRecord>> {
        self.entries
            .entries()
            .into_iter()
            .filter(|(k, _)| k.kind == kind)
            .map(|(_, v)| v)
            .collect()
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }
}

/// `id rdf:type <class>` for a minted entity
pub(crate) fn describe(graph: &mut Graph, id: &ResolvedId, kind: EntityKind) {
    graph.add(id, &vocab::RDF_TYPE, kind.type_iri());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use phenotrack_graph::Literal;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGateway {
        result: Graph,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryGateway for FixedGateway {
        async fn list_unpublished(&self) -> Result<Graph, GatewayError> {
            Ok(Graph::new())
        }

        async fn query(&self, _: &QueryPattern, _: &ArtifactId) -> Result<Graph, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    fn artifact() -> ArtifactId {
        ArtifactId::new(
            Iri::new("http://example.org/artifact/1").unwrap(),
            Iri::new("http://example.org/artifact/1/v1").unwrap(),
        )
    }

    fn project() -> ResolvedId {
        ResolvedId::try_from("http://example.org/project/1").unwrap()
    }

    fn mint_tray(_: &NaturalKey) -> Minted {
        let id = ResolvedId::mint(EntityKind::Tray);
        let mut description = Graph::new();
        describe(&mut description, &id, EntityKind::Tray);
        Minted::new(id, description)
    }

    #[tokio::test]
    async fn miss_mints_then_hits() {
        let gateway = FixedGateway {
            result: Graph::new(),
            calls: AtomicUsize::new(0),
        };
        let cache = IdentityCache::new(Arc::new(Diagnostics::new()));
        let request = ResolveRequest::new(EntityKind::Tray, "TRAY-01".into())
            .scoped(&project())
            .probe_label(&artifact());

        let first = cache.resolve(request.clone(), &gateway, mint_tray).await.unwrap();
        assert!(first.is_provisional());
        assert_eq!(first.description.len(), 1);

        let second = cache.resolve(request, &gateway, mint_tray).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ambiguous_match_takes_first_and_warns() {
        let a = Iri::new("http://example.org/tray/a").unwrap();
        let b = Iri::new("http://example.org/tray/b").unwrap();
        let mut result = Graph::new();
        result.add(&a, &vocab::RDF_TYPE, &*vocab::TRAY);
        result.add(&a, &vocab::RDFS_LABEL, Literal::plain("TRAY-01"));
        result.add(&b, &vocab::RDF_TYPE, &*vocab::TRAY);
        result.add(&b, &vocab::RDFS_LABEL, Literal::plain("TRAY-01 spare"));
        let gateway = FixedGateway {
            result,
            calls: AtomicUsize::new(0),
        };
        let diagnostics = Arc::new(Diagnostics::new());
        let cache = IdentityCache::new(Arc::clone(&diagnostics));

        let record = cache
            .resolve(
                ResolveRequest::new(EntityKind::Tray, "TRAY-01".into())
                    .scoped(&project())
                    .probe_label(&artifact()),
                &gateway,
                mint_tray,
            )
            .await
            .unwrap();
        assert_eq!(record.id.iri(), &a);
        assert!(!record.is_provisional());
        assert_eq!(
            diagnostics.warnings(),
            vec![Warning::AmbiguousMatch {
                kind: EntityKind::Tray,
                key: "TRAY-01".into(),
                candidates: 2,
                chosen: ResolvedId::canonical(a),
            }]
        );
    }

    fn labelled_trays(labels: &[(&str, &str)]) -> Graph {
        let mut result = Graph::new();
        for (subject, label) in labels {
            let iri = Iri::new(*subject).unwrap();
            result.add(&iri, &vocab::RDF_TYPE, &*vocab::TRAY);
            result.add(&iri, &vocab::RDFS_LABEL, Literal::plain(*label));
        }
        result
    }

    #[test]
    fn label_must_match_whole_or_first_word() {
        assert!(label_matches("TRAY-01", "TRAY-01"));
        assert!(label_matches("  TRAY-01 spare ", "TRAY-01"));
        assert!(!label_matches("TRAY-010", "TRAY-01"));
        assert!(!label_matches("TRAY-01-B", "TRAY-01"));
    }

    #[tokio::test]
    async fn longer_label_sharing_the_prefix_is_not_a_match() {
        let gateway = FixedGateway {
            result: labelled_trays(&[("http://example.org/tray/10", "TRAY-010")]),
            calls: AtomicUsize::new(0),
        };
        let diagnostics = Arc::new(Diagnostics::new());
        let cache = IdentityCache::new(Arc::clone(&diagnostics));
        let record = cache
            .resolve(
                ResolveRequest::new(EntityKind::Tray, "TRAY-01".into())
                    .scoped(&project())
                    .probe_label(&artifact()),
                &gateway,
                mint_tray,
            )
            .await
            .unwrap();
        assert!(record.is_provisional());
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn barcode_wins_over_label() {
        let mut result = labelled_trays(&[("http://example.org/tray/1", "TRAY-01")]);
        let by_barcode = Iri::new("http://example.org/tray/2").unwrap();
        result.add(&by_barcode, &vocab::RDF_TYPE, &*vocab::TRAY);
        result.add(&by_barcode, &vocab::RDFS_LABEL, Literal::plain("North bench"));
        result.add(&by_barcode, &vocab::HAS_BARCODE, Literal::plain("TRAY-01"));
        let gateway = FixedGateway {
            result,
            calls: AtomicUsize::new(0),
        };
        let diagnostics = Arc::new(Diagnostics::new());
        let cache = IdentityCache::new(Arc::clone(&diagnostics));
        let record = cache
            .resolve(
                ResolveRequest::new(EntityKind::Tray, "TRAY-01".into())
                    .scoped(&project())
                    .probe_barcode(&artifact()),
                &gateway,
                mint_tray,
            )
            .await
            .unwrap();
        assert_eq!(record.id.iri(), &by_barcode);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn scoped_kind_without_scope_fails() {
        let gateway = FixedGateway {
            result: Graph::new(),
            calls: AtomicUsize::new(0),
        };
        let cache = IdentityCache::new(Arc::new(Diagnostics::new()));
        let err = cache
            .resolve(ResolveRequest::new(EntityKind::Pot, "POT-07".into()), &gateway, |_| {
                Minted::new(ResolvedId::mint(EntityKind::Pot), Graph::new())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingScope { kind: EntityKind::Pot, .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn register_reports_duplicates_and_conflicts() {
        let diagnostics = Arc::new(Diagnostics::new());
        let cache = IdentityCache::new(Arc::clone(&diagnostics));
        let p1 = ResolvedId::try_from("http://example.org/p1").unwrap();
        let p2 = ResolvedId::try_from("http://example.org/p2").unwrap();
        let key: NaturalKey = "Project#2013-0015".into();

        let (_, first) = cache.register(EntityRecord::canonical(EntityKind::Project, key.clone(), p1.clone()), None);
        let (kept, second) = cache.register(EntityRecord::canonical(EntityKind::Project, key.clone(), p2), None);
        assert!(first);
        assert!(!second);
        assert_eq!(kept.id, p1);

        let other: NaturalKey = "Project#2013-0016".into();
        let (_, third) = cache.register(EntityRecord::canonical(EntityKind::Project, other, p1), None);
        assert!(third);

        let warnings = diagnostics.warnings();
        assert!(matches!(warnings[0], Warning::DuplicateCanonicalKey { .. }));
        assert!(matches!(warnings[1], Warning::ConflictingKeys { .. }));
        assert_eq!(cache.len(), 2);
    }
}
