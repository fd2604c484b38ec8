//! Change-set accumulation, one pending graph per owning artifact
//!
//! Row resolvers for the same project all write into the same
//! [`ChangeSet`]. Each merge holds only that change-set's lock, so projects
//! never contend with each other.

use crate::cache::RunCache;
use parking_lot::Mutex;
use phenotrack_graph::{ArtifactId, Graph, Triple};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Finished change-sets keyed by artifact, ready to append
pub type UploadQueue = BTreeMap<ArtifactId, Graph>;

/// Pending triples for one artifact
#[derive(Debug)]
pub struct ChangeSet {
    artifact: ArtifactId,
    graph: Mutex<Graph>,
}

impl ChangeSet {
    /// Empty change-set for `artifact`
    #[must_use]
    pub fn new(artifact: ArtifactId) -> Self {
        Self {
            artifact,
            graph: Mutex::new(Graph::new()),
        }
    }

    /// Owning artifact
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &ArtifactId {
        &self.artifact
    }

    /// Atomically append every triple of `graph`, returning how many were new
    pub fn merge(&self, graph: &Graph) -> usize {
        let mut guard = self.graph.lock();
        let before = guard.len();
        guard.merge(graph);
        guard.len() - before
    }

    /// Copy of the current contents
    #[must_use]
    pub fn snapshot(&self) -> Graph {
        self.graph.lock().clone()
    }

    /// Membership test
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.graph.lock().contains(triple)
    }

    /// Number of triples
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.lock().len()
    }

    /// True if nothing has been merged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.lock().is_empty()
    }

    fn into_graph(self) -> Graph {
        self.graph.into_inner()
    }
}

/// All change-sets of a run
#[derive(Debug, Default)]
pub struct ChangeSetAccumulator {
    sets: RunCache<ArtifactId, Arc<ChangeSet>>,
}

impl ChangeSetAccumulator {
    /// Empty accumulator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The change-set for `artifact`, created on first use
    #[must_use]
    pub fn get_or_create(&self, artifact: &ArtifactId) -> Arc<ChangeSet> {
        let (set, created) = self
            .sets
            .get_or_insert_with(artifact.clone(), || Arc::new(ChangeSet::new(artifact.clone())));
        if created {
            tracing::debug!("opened change-set for {artifact}");
        }
        set
    }

    /// Merge `graph` into the change-set for `artifact`
    pub fn merge(&self, artifact: &ArtifactId, graph: &Graph) -> usize {
        self.get_or_create(artifact).merge(graph)
    }

    /// Existing change-set, if any
    #[must_use]
    pub fn get(&self, artifact: &ArtifactId) -> Option<Arc<ChangeSet>> {
        self.sets.get(artifact)
    }

    /// Number of change-sets
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True if no change-set was opened
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Hand off every change-set; nothing can be merged afterwards
    #[must_use]
    pub fn into_queue(self) -> UploadQueue {
        self.sets
            .into_entries()
            .into_iter()
            .map(|(artifact, set)| {
                let graph = Arc::try_unwrap(set).map_or_else(|shared| shared.snapshot(), ChangeSet::into_graph);
                (artifact, graph)
            })
            .collect()
    }
}
