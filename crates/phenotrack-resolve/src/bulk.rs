//! Bulk pre-population of project, experiment and genotype identities
//!
//! Runs once per ingest, before any row is resolved. Projects are read
//! from the unpublished-artifact listing; experiments and genotypes are
//! then fetched per registered project.

use crate::diagnostics::{Diagnostics, SkipReason, Warning};
use crate::error::ResolveError;
use crate::gateway::{QueryGateway, QueryPattern};
use crate::identity::{EntityRecord, IdentityCache};
use crate::labels::{ExperimentLabel, ProjectLabel};
use futures::future::try_join_all;
use phenotrack_graph::{vocab, ArtifactId, EntityKind, Graph, Iri, NaturalKey, ResolvedId, Term};

/// Counts from one bulk pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Projects registered
    pub projects: usize,
    /// Experiments registered
    pub experiments: usize,
    /// Genotypes registered
    pub genotypes: usize,
    /// Artifacts or entities skipped with a warning
    pub skipped: usize,
}

impl std::ops::AddAssign for BulkSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.projects += rhs.projects;
        self.experiments += rhs.experiments;
        self.genotypes += rhs.genotypes;
        self.skipped += rhs.skipped;
    }
}

/// Project registered by the bulk pass
#[derive(Debug, Clone)]
struct RegisteredProject {
    id: ResolvedId,
    artifact: ArtifactId,
}

/// Pre-populates the identity cache from the remote listing
#[derive(Debug)]
pub struct BulkListResolver<'a> {
    identity: &'a IdentityCache,
    diagnostics: &'a Diagnostics,
}

impl<'a> BulkListResolver<'a> {
    /// Resolver writing into `identity`
    #[must_use]
    pub fn new(identity: &'a IdentityCache, diagnostics: &'a Diagnostics) -> Self {
        Self {
            identity,
            diagnostics,
        }
    }

    /// Run the bulk pass
    ///
    /// # Errors
    /// Returns [`ResolveError::Gateway`] if any remote call fails.
    /// Malformed artifacts and entities are skipped with a warning.
    pub async fn run(&self, gateway: &dyn QueryGateway) -> Result<BulkSummary, ResolveError> {
        let listing = gateway.list_unpublished().await?;
        let mut summary = BulkSummary::default();
        let mut registered = Vec::new();

        for ontology in listing.subjects_of_type(&vocab::OWL_ONTOLOGY) {
            let Some(artifact) = artifact_id(&listing, &ontology) else {
                tracing::warn!("artifact {ontology} has no version IRI, ignoring");
                continue;
            };
            match self.project_of(&listing, &ontology, &artifact) {
                Ok(Some(project)) => {
                    summary.projects += 1;
                    registered.push(project);
                }
                Ok(None) => {}
                Err(reason) => {
                    summary.skipped += 1;
                    self.diagnostics.warn(Warning::SkippedArtifact { artifact, reason });
                }
            }
        }

        let per_project = try_join_all(
            registered
                .iter()
                .map(|project| self.populate_project(gateway, project)),
        )
        .await?;
        for counts in per_project {
            summary += counts;
        }

        tracing::info!(
            "bulk pass registered {} projects, {} experiments, {} genotypes ({} skipped)",
            summary.projects,
            summary.experiments,
            summary.genotypes,
            summary.skipped
        );
        Ok(summary)
    }

    /// Register the project an artifact holds
    ///
    /// `Ok(None)` means the artifact holds something other than a project,
    /// or lost a duplicate-key race.
    fn project_of(
        &self,
        listing: &Graph,
        ontology: &Term,
        artifact: &ArtifactId,
    ) -> Result<Option<RegisteredProject>, SkipReason> {
        let tops = listing.objects(ontology, &vocab::HAS_TOP_OBJECT);
        let top = match tops.as_slice() {
            [] => return Err(SkipReason::NoTopObject),
            [top] => *top,
            _ => return Err(SkipReason::MultipleProjects),
        };
        let is_project = listing
            .objects(top, &vocab::RDF_TYPE)
            .iter()
            .any(|t| t.as_iri() == Some(&*vocab::PROJECT));
        if !is_project {
            tracing::info!("artifact {artifact} does not hold a project, skipping");
            return Ok(None);
        }
        let Some(iri) = top.as_iri() else {
            return Err(SkipReason::NotAnIri);
        };
        let label = label_of(listing, top)?;
        let parsed = ProjectLabel::parse(&label).ok_or(SkipReason::MalformedLabel(label))?;

        let id = ResolvedId::canonical(iri.clone());
        let record = EntityRecord::canonical(EntityKind::Project, NaturalKey::new(parsed.to_string()), id.clone())
            .with_artifact(Some(artifact.clone()));
        let (_, inserted) = self.identity.register(record, None);
        Ok(inserted.then(|| RegisteredProject {
            id,
            artifact: artifact.clone(),
        }))
    }

    async fn populate_project(
        &self,
        gateway: &dyn QueryGateway,
        project: &RegisteredProject,
    ) -> Result<BulkSummary, ResolveError> {
        let mut summary = BulkSummary::default();

        let experiments = gateway
            .query(
                &QueryPattern::ByType {
                    class: vocab::EXPERIMENT.clone(),
                },
                &project.artifact,
            )
            .await?;
        for subject in experiments.subjects_of_type(&vocab::EXPERIMENT) {
            match self.register_experiment(&experiments, &subject, project) {
                Ok(true) => summary.experiments += 1,
                Ok(false) => {}
                Err(reason) => {
                    summary.skipped += 1;
                    self.diagnostics.warn(Warning::SkippedEntity {
                        kind: EntityKind::Experiment,
                        subject: subject.to_string(),
                        reason,
                    });
                }
            }
        }

        let genotypes = gateway
            .query(
                &QueryPattern::ByTypeAllProperties {
                    class: vocab::GENOTYPE.clone(),
                },
                &project.artifact,
            )
            .await?;
        for subject in genotypes.subjects_of_type(&vocab::GENOTYPE) {
            if self.register_genotype(&genotypes, &subject, project) {
                summary.genotypes += 1;
            }
        }

        tracing::debug!(
            "project {} has {} experiments and {} genotypes",
            project.id,
            summary.experiments,
            summary.genotypes
        );
        Ok(summary)
    }

    fn register_experiment(
        &self,
        graph: &Graph,
        subject: &Term,
        project: &RegisteredProject,
    ) -> Result<bool, SkipReason> {
        let iri = subject.as_iri().ok_or(SkipReason::NotAnIri)?;
        let label = label_of(graph, subject)?;
        let parsed = ExperimentLabel::parse(&label).ok_or(SkipReason::MalformedLabel(label))?;
        let record = EntityRecord::canonical(
            EntityKind::Experiment,
            NaturalKey::new(parsed.to_string()),
            ResolvedId::canonical(iri.clone()),
        )
        .with_parent(Some(project.id.clone()))
        .with_artifact(Some(project.artifact.clone()));
        Ok(self.identity.register(record, Some(&project.id)).1)
    }

    fn register_genotype(&self, graph: &Graph, subject: &Term, project: &RegisteredProject) -> bool {
        let Some(iri) = subject.as_iri() else {
            return false;
        };
        let first = |pred: &Iri| {
            graph
                .literals(subject, pred)
                .first()
                .map(|lit| lit.lexical().to_string())
        };
        let (Some(genus), Some(species), Some(line)) = (
            first(&*vocab::HAS_GENUS),
            first(&*vocab::HAS_SPECIES),
            first(&*vocab::HAS_LINE),
        ) else {
            tracing::debug!("genotype {subject} lacks genus, species or line; not cached");
            return false;
        };
        let record = EntityRecord::canonical(
            EntityKind::Genotype,
            genotype_key(&genus, &species, &line),
            ResolvedId::canonical(iri.clone()),
        )
        .with_parent(Some(project.id.clone()))
        .with_artifact(Some(project.artifact.clone()));
        self.identity.register(record, Some(&project.id)).1
    }
}

/// Natural key of a genotype within its project
#[must_use]
pub fn genotype_key(genus: &str, species: &str, line: &str) -> NaturalKey {
    NaturalKey::composed(&[genus, species, line])
}

fn artifact_id(listing: &Graph, ontology: &Term) -> Option<ArtifactId> {
    let ontology_iri = ontology.as_iri()?;
    let version = listing
        .objects(ontology, &vocab::OWL_VERSION_IRI)
        .into_iter()
        .find_map(Term::as_iri)?;
    Some(ArtifactId::new(ontology_iri.clone(), version.clone()))
}

fn label_of(graph: &Graph, subject: &Term) -> Result<String, SkipReason> {
    let labels = graph.objects(subject, &vocab::RDFS_LABEL);
    let first = labels.first().ok_or(SkipReason::NoLabel)?;
    first
        .as_literal()
        .map(|lit| lit.lexical().to_string())
        .ok_or(SkipReason::NonLiteralLabel)
}
