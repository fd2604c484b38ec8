//! Row resolver: one tray-scan record to one change-set contribution
//!
//! Each row resolves project, experiment, tray, pot, genotype and material
//! in that order, then merges the row's triples plus the descriptions of
//! any provisional entities into the project's change-set in one step.

use crate::bulk::genotype_key;
use crate::changeset::ChangeSetAccumulator;
use crate::diagnostics::Diagnostics;
use crate::error::ResolveError;
use crate::gateway::QueryGateway;
use crate::header::{ControlFlag, TrayScanRecord};
use crate::identity::{describe, EntityRecord, IdentityCache, Minted, ResolveRequest};
use crate::labels;
use phenotrack_graph::{vocab, ArtifactId, EntityKind, Graph, Literal, NaturalKey, ResolvedId};
use std::sync::Arc;

/// What one row resolved to
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// 1-based data row number
    pub row: usize,
    /// Artifact the row was merged into
    pub artifact: ArtifactId,
    /// Tray
    pub tray: ResolvedId,
    /// Pot
    pub pot: ResolvedId,
    /// Genotype
    pub genotype: ResolvedId,
    /// Material
    pub material: ResolvedId,
    /// Triples that were new to the change-set
    pub added: usize,
}

/// Resolves rows against shared run state
#[derive(Clone, Copy)]
pub struct RowResolver<'a> {
    identity: &'a IdentityCache,
    changes: &'a ChangeSetAccumulator,
    diagnostics: &'a Diagnostics,
    gateway: &'a dyn QueryGateway,
}

impl<'a> RowResolver<'a> {
    /// Resolver over shared caches
    #[must_use]
    pub fn new(
        identity: &'a IdentityCache,
        changes: &'a ChangeSetAccumulator,
        diagnostics: &'a Diagnostics,
        gateway: &'a dyn QueryGateway,
    ) -> Self {
        Self {
            identity,
            changes,
            diagnostics,
            gateway,
        }
    }

    /// Resolve one record and merge its triples
    ///
    /// # Errors
    /// - [`ResolveError::UnknownProject`] if the project was not pre-populated
    /// - [`ResolveError::ExperimentOutsideProject`] if the experiment belongs
    ///   to another project
    /// - [`ResolveError::Gateway`] if a remote probe fails
    pub async fn resolve(&self, row: usize, record: &TrayScanRecord) -> Result<RowOutcome, ResolveError> {
        let project_key = labels::project_key(&record.project_id);
        let project = self
            .identity
            .lookup(EntityKind::Project, &NaturalKey::new(&project_key), None)
            .ok_or_else(|| ResolveError::UnknownProject {
                key: project_key.clone(),
                row,
            })?;
        let artifact = project.artifact.clone().ok_or(ResolveError::UnknownProject {
            key: project_key,
            row,
        })?;

        let experiment = self.experiment(row, record, &project, &artifact).await?;
        let tray = self.tray(record, &project, &experiment, &artifact).await?;
        let pot = self.pot(record, &project, &tray, &artifact).await?;
        let genotype = self.genotype(record, &project, &artifact).await?;
        let material = self.material(record, &pot, &genotype).await?;

        let mut graph = Graph::new();
        emit_row(&mut graph, record, &experiment.id, &tray.id, &pot.id, &material.id);
        for entity in [&experiment, &tray, &pot, &genotype, &material] {
            if entity.is_provisional() {
                graph.merge(&entity.description);
            }
        }
        let added = self.changes.merge(&artifact, &graph);
        tracing::debug!("row {row}: pot {} merged {added} new triples into {artifact}", pot.id);

        Ok(RowOutcome {
            row,
            artifact,
            tray: tray.id.clone(),
            pot: pot.id.clone(),
            genotype: genotype.id.clone(),
            material: material.id.clone(),
            added,
        })
    }

    async fn experiment(
        &self,
        row: usize,
        record: &TrayScanRecord,
        project: &EntityRecord,
        artifact: &ArtifactId,
    ) -> Result<Arc<EntityRecord>, ResolveError> {
        let key = labels::experiment_key(&record.experiment_id);
        let outside = || ResolveError::ExperimentOutsideProject {
            experiment: key.clone(),
            project: project.key.to_string(),
            row,
        };
        if let Some(label) = labels::ExperimentLabel::parse(&key) {
            if label.project.to_string() != project.key.as_str() {
                return Err(outside());
            }
        }

        let project_id = project.id.clone();
        let request = ResolveRequest::new(EntityKind::Experiment, NaturalKey::new(&key))
            .scoped(&project.id)
            .with_parent(&project.id)
            .in_artifact(artifact)
            .probe_label(artifact);
        let experiment = self
            .identity
            .resolve(request, self.gateway, move |key| {
                let id = ResolvedId::mint(EntityKind::Experiment);
                let mut description = Graph::new();
                description.add(&project_id, &vocab::HAS_EXPERIMENT, &id);
                describe(&mut description, &id, EntityKind::Experiment);
                description.add(&id, &vocab::RDFS_LABEL, Literal::plain(key.as_str()));
                Minted::new(id, description)
            })
            .await?;
        if experiment.parent.as_ref() != Some(&project.id) {
            return Err(outside());
        }
        Ok(experiment)
    }

    async fn tray(
        &self,
        record: &TrayScanRecord,
        project: &EntityRecord,
        experiment: &EntityRecord,
        artifact: &ArtifactId,
    ) -> Result<Arc<EntityRecord>, ResolveError> {
        let request = ResolveRequest::new(EntityKind::Tray, NaturalKey::new(&record.tray_id))
            .scoped(&project.id)
            .with_parent(&experiment.id)
            .in_artifact(artifact)
            .probe_barcode(artifact);
        self.identity
            .resolve(request, self.gateway, |_| mint_plain(EntityKind::Tray))
            .await
    }

    async fn pot(
        &self,
        record: &TrayScanRecord,
        project: &EntityRecord,
        tray: &EntityRecord,
        artifact: &ArtifactId,
    ) -> Result<Arc<EntityRecord>, ResolveError> {
        let request = ResolveRequest::new(EntityKind::Pot, NaturalKey::new(&record.plant_id))
            .scoped(&project.id)
            .with_parent(&tray.id)
            .in_artifact(artifact)
            .probe_barcode(artifact);
        self.identity
            .resolve(request, self.gateway, |_| mint_plain(EntityKind::Pot))
            .await
    }

    async fn genotype(
        &self,
        record: &TrayScanRecord,
        project: &EntityRecord,
        artifact: &ArtifactId,
    ) -> Result<Arc<EntityRecord>, ResolveError> {
        let key = genotype_key(&record.genus, &record.species, &record.plant_name);
        let request = ResolveRequest::new(EntityKind::Genotype, key)
            .scoped(&project.id)
            .with_parent(&project.id)
            .in_artifact(artifact)
            .probe_properties(
                artifact,
                vec![
                    (vocab::HAS_GENUS.clone(), record.genus.clone()),
                    (vocab::HAS_SPECIES.clone(), record.species.clone()),
                    (vocab::HAS_LINE.clone(), record.plant_name.clone()),
                ],
            );
        let project_id = project.id.clone();
        self.identity
            .resolve(request, self.gateway, move |_| mint_genotype(&project_id, record))
            .await
    }

    async fn material(
        &self,
        record: &TrayScanRecord,
        pot: &EntityRecord,
        genotype: &EntityRecord,
    ) -> Result<Arc<EntityRecord>, ResolveError> {
        let request = ResolveRequest::new(EntityKind::Material, NaturalKey::new(genotype.id.iri().as_str()))
            .scoped(&pot.id)
            .with_parent(&pot.id);
        let diagnostics = self.diagnostics;
        self.identity
            .resolve(request, self.gateway, move |_| {
                let control = ControlFlag::parse_or_warn(&record.control, diagnostics);
                mint_material(&pot.id, &genotype.id, record, control)
            })
            .await
    }
}

impl std::fmt::Debug for RowResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowResolver")
            .field("identity", &self.identity.len())
            .field("change_sets", &self.changes.len())
            .finish_non_exhaustive()
    }
}

fn mint_plain(kind: EntityKind) -> Minted {
    let id = ResolvedId::mint(kind);
    let mut description = Graph::new();
    describe(&mut description, &id, kind);
    Minted::new(id, description)
}

fn mint_genotype(project: &ResolvedId, record: &TrayScanRecord) -> Minted {
    let id = ResolvedId::mint_with(EntityKind::Genotype, &record.plant_line_number);
    let mut g = Graph::new();
    g.add(project, &vocab::HAS_GENOTYPE, &id);
    describe(&mut g, &id, EntityKind::Genotype);
    g.add(
        &id,
        &vocab::RDFS_LABEL,
        Literal::plain(format!("{} {} ({})", record.genus, record.species, record.plant_name)),
    );
    g.add(
        &id,
        &vocab::RDFS_COMMENT,
        Literal::plain(format!(
            "Plant line in : {} {} named, {} : labelled as number {}",
            record.genus, record.species, record.plant_name, record.plant_line_number
        )),
    );
    g.add(&id, &vocab::HAS_GENUS, Literal::plain(&record.genus));
    g.add(&id, &vocab::HAS_SPECIES, Literal::plain(&record.species));
    g.add(&id, &vocab::HAS_LINE, Literal::plain(&record.plant_name));
    g.add(&id, &vocab::HAS_LINE_NUMBER, Literal::plain(&record.plant_line_number));
    Minted::new(id, g)
}

fn mint_material(pot: &ResolvedId, genotype: &ResolvedId, record: &TrayScanRecord, control: ControlFlag) -> Minted {
    let id = ResolvedId::mint(EntityKind::Material);
    let mut g = Graph::new();
    g.add(pot, &vocab::HAS_MATERIAL, &id);
    describe(&mut g, &id, EntityKind::Material);
    g.add(
        &id,
        &vocab::RDFS_LABEL,
        Literal::plain(format!(
            "Material for pot {} containing line {}",
            record.pot_number, record.plant_line_number
        )),
    );
    g.add(&id, &vocab::REFERS_TO_GENOTYPE, genotype);
    g.add(&id, &vocab::HAS_CONTROL, control.iri());
    Minted::new(id, g)
}

/// Triples every row contributes regardless of what was minted
fn emit_row(
    g: &mut Graph,
    record: &TrayScanRecord,
    experiment: &ResolvedId,
    tray: &ResolvedId,
    pot: &ResolvedId,
    material: &ResolvedId,
) {
    g.add(tray, &vocab::RDF_TYPE, &*vocab::TRAY);
    g.add(experiment, &vocab::HAS_TRAY, tray);
    g.add(tray, &vocab::HAS_BARCODE, Literal::plain(&record.tray_id));
    g.add(tray, &vocab::RDFS_LABEL, Literal::plain(&record.tray_notes));
    g.add(tray, &vocab::HAS_TRAY_TYPE, Literal::plain(&record.tray_type_name));
    g.add(pot, &vocab::HAS_TRAY_NUMBER, Literal::string(&record.tray_number));
    g.add(pot, &vocab::HAS_TRAY_ROW_NUMBER, Literal::string(&record.tray_row_number));

    g.add(pot, &vocab::RDF_TYPE, &*vocab::POT);
    g.add(tray, &vocab::HAS_POT, pot);
    g.add(pot, &vocab::HAS_MATERIAL, material);
    g.add(pot, &vocab::HAS_BARCODE, Literal::plain(&record.plant_id));

    let typed = [
        (&*vocab::HAS_POT_NUMBER, &record.pot_number),
        (&*vocab::HAS_POT_TYPE, &record.pot_type),
        (&*vocab::HAS_POT_COLUMN_NUMBER_OVERALL, &record.column_number),
        (&*vocab::HAS_POT_COLUMN_NUMBER_REPLICATE, &record.column_number_rep),
        (&*vocab::HAS_POT_COLUMN_NUMBER_TRAY, &record.column_number_tray),
    ];
    for (pred, value) in typed {
        g.add(pot, pred, Literal::string(value));
    }
    g.add(pot, &vocab::HAS_POT_COLUMN_LETTER_TRAY, Literal::plain(&record.column_letter));
    g.add(pot, &vocab::HAS_POT_POSITION_TRAY, Literal::plain(&record.position));
    let typed = [
        (&*vocab::HAS_POT_NUMBER_TRAY, &record.pot_number_tray),
        (&*vocab::HAS_POT_NUMBER_REPLICATE, &record.pot_replicate_number),
        (&*vocab::HAS_REPLICATE, &record.replicate_number),
        (&*vocab::HAS_POT_ROW_NUMBER_REPLICATE, &record.row_number_rep),
        (&*vocab::HAS_POT_ROW_NUMBER_TRAY, &record.row_number_tray),
    ];
    for (pred, value) in typed {
        g.add(pot, pred, Literal::string(value));
    }

    let label = if record.plant_notes.is_empty() {
        format!("Pot {}", record.plant_name)
    } else {
        format!("Pot {} : {}", record.plant_name, record.plant_notes)
    };
    g.add(pot, &vocab::RDFS_LABEL, Literal::plain(label));
}
