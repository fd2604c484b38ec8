use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use phenotrack_graph::{vocab, ArtifactId, EntityKind, Graph, Iri, Literal, Term};
use phenotrack_resolve::{AppendGateway, GatewayError, QueryGateway, QueryPattern};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredArtifact {
    id: ArtifactId,
    top: Iri,
    graph: Graph,
}

/// In-memory graph service holding artifacts in insertion order
#[derive(Debug, Default)]
pub struct MemoryGateway {
    artifacts: Mutex<IndexMap<Iri, StoredArtifact>>,
    extra_listing: Mutex<Graph>,
    queries: AtomicUsize,
    appends: AtomicUsize,
    query_delay: Mutex<Option<Duration>>,
    fail_queries: AtomicBool,
    fail_appends: AtomicBool,
    unchanged_appends: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unpublished artifact whose top object is a project
    pub fn add_project(&self, n: u32, label: &str) -> (ArtifactId, Iri) {
        let project = iri(&format!("http://example.org/project/{n}"));
        let mut graph = Graph::new();
        graph.add(&project, &vocab::RDF_TYPE, &*vocab::PROJECT);
        graph.add(&project, &vocab::RDFS_LABEL, Literal::plain(label));
        (self.add_artifact(n, project.clone(), graph), project)
    }

    /// Register an artifact with an arbitrary top object and graph
    pub fn add_artifact(&self, n: u32, top: Iri, graph: Graph) -> ArtifactId {
        let id = ArtifactId::new(
            iri(&format!("http://example.org/artifact/{n}")),
            iri(&format!("http://example.org/artifact/{n}/version/1")),
        );
        self.artifacts.lock().insert(
            id.ontology().clone(),
            StoredArtifact {
                id: id.clone(),
                top,
                graph,
            },
        );
        id
    }

    /// Add an entity with a type and label to an artifact
    pub fn add_entity(&self, artifact: &ArtifactId, kind: EntityKind, subject: &str, label: &str) -> Iri {
        let subject = iri(subject);
        let mut graph = Graph::new();
        graph.add(&subject, &vocab::RDF_TYPE, kind.type_iri());
        graph.add(&subject, &vocab::RDFS_LABEL, Literal::plain(label));
        self.extend(artifact, &graph);
        subject
    }

    /// Add a genotype described by genus, species and line
    pub fn add_genotype(&self, artifact: &ArtifactId, subject: &str, genus: &str, species: &str, line: &str) -> Iri {
        let subject = iri(subject);
        let mut graph = Graph::new();
        graph.add(&subject, &vocab::RDF_TYPE, &*vocab::GENOTYPE);
        graph.add(&subject, &vocab::RDFS_LABEL, Literal::plain(format!("{genus} {species} ({line})")));
        graph.add(&subject, &vocab::HAS_GENUS, Literal::plain(genus));
        graph.add(&subject, &vocab::HAS_SPECIES, Literal::plain(species));
        graph.add(&subject, &vocab::HAS_LINE, Literal::plain(line));
        self.extend(artifact, &graph);
        subject
    }

    /// Merge triples into a stored artifact
    pub fn extend(&self, artifact: &ArtifactId, graph: &Graph) {
        if let Some(stored) = self.artifacts.lock().get_mut(artifact.ontology()) {
            stored.graph.merge(graph);
        }
    }

    /// Append raw triples to every listing, for malformed artifacts
    pub fn extend_listing(&self, graph: &Graph) {
        self.extra_listing.lock().merge(graph);
    }

    /// Current graph of an artifact
    pub fn graph(&self, artifact: &ArtifactId) -> Option<Graph> {
        self.artifacts.lock().get(artifact.ontology()).map(|s| s.graph.clone())
    }

    /// Current version of an artifact
    pub fn current(&self, artifact: &ArtifactId) -> Option<ArtifactId> {
        self.artifacts.lock().get(artifact.ontology()).map(|s| s.id.clone())
    }

    /// Pattern queries answered so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Appends accepted so far
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    /// Delay every pattern query, widening race windows
    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock() = Some(delay);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Answer appends with the version they were given
    pub fn unchanged_appends(&self, unchanged: bool) {
        self.unchanged_appends.store(unchanged, Ordering::SeqCst);
    }

    fn answer(graph: &Graph, pattern: &QueryPattern) -> Graph {
        let mut out = Graph::new();
        for subject in graph.subjects_of_type(pattern.class()) {
            let labels = graph.literals(&subject, &vocab::RDFS_LABEL);
            match pattern {
                QueryPattern::ByType { .. } => {}
                QueryPattern::ByTypeLabelPrefix { prefix, .. } => {
                    if !labels.iter().any(|l| l.lexical().starts_with(prefix.as_str())) {
                        continue;
                    }
                }
                QueryPattern::ByTypeAllProperties { .. } => {
                    out.merge(&graph.subject_graph(&subject));
                    continue;
                }
            }
            out.add(subject.clone(), &vocab::RDF_TYPE, pattern.class());
            for label in labels {
                out.add(subject.clone(), &vocab::RDFS_LABEL, label.clone());
            }
        }
        out
    }
}

#[async_trait]
impl QueryGateway for MemoryGateway {
    async fn list_unpublished(&self) -> Result<Graph, GatewayError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("listing refused".into()));
        }
        let mut listing = Graph::new();
        for stored in self.artifacts.lock().values() {
            let ontology = stored.id.ontology();
            let top = Term::from(&stored.top);
            listing.add(ontology, &vocab::RDF_TYPE, &*vocab::OWL_ONTOLOGY);
            listing.add(ontology, &vocab::OWL_VERSION_IRI, stored.id.version());
            listing.add(ontology, &vocab::HAS_TOP_OBJECT, &stored.top);
            for triple in stored.graph.matching(Some(&top), Some(&*vocab::RDF_TYPE), None) {
                listing.insert(triple.clone());
            }
            for triple in stored.graph.matching(Some(&top), Some(&*vocab::RDFS_LABEL), None) {
                listing.insert(triple.clone());
            }
        }
        listing.merge(&self.extra_listing.lock());
        Ok(listing)
    }

    async fn query(&self, pattern: &QueryPattern, artifact: &ArtifactId) -> Result<Graph, GatewayError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.query_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(GatewayError::Network(format!("query {pattern} refused")));
        }
        let artifacts = self.artifacts.lock();
        let stored = artifacts
            .get(artifact.ontology())
            .ok_or_else(|| GatewayError::NotFound(artifact.to_string()))?;
        Ok(Self::answer(&stored.graph, pattern))
    }
}

#[async_trait]
impl AppendGateway for MemoryGateway {
    async fn append(&self, artifact: &ArtifactId, graph: &Graph) -> Result<ArtifactId, GatewayError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(GatewayError::Protocol(format!("append to {artifact} rejected")));
        }
        let mut artifacts = self.artifacts.lock();
        let stored = artifacts
            .get_mut(artifact.ontology())
            .ok_or_else(|| GatewayError::NotFound(artifact.to_string()))?;
        stored.graph.merge(graph);
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.unchanged_appends.load(Ordering::SeqCst) {
            return Ok(artifact.clone());
        }
        let next = self.appends.load(Ordering::SeqCst) + 1;
        stored.id = ArtifactId::new(
            artifact.ontology().clone(),
            iri(&format!("{}/version/{next}", artifact.ontology())),
        );
        Ok(stored.id.clone())
    }
}

fn iri(value: &str) -> Iri {
    Iri::new(value).unwrap()
}
