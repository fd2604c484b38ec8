//! Append finished change-sets to their artifacts

use crate::changeset::UploadQueue;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ResolveError;
use crate::gateway::AppendGateway;
use phenotrack_graph::ArtifactId;
use std::collections::BTreeMap;

/// Append every queued change-set, returning old to new artifact versions
///
/// An append that hands back the version it was given is reported as
/// [`Warning::UnchangedAppend`] and left out of the result.
///
/// # Errors
/// [`ResolveError::AppendFailed`] on the first failed append. Change-sets
/// appended before it stay appended.
pub async fn publish(
    queue: UploadQueue,
    gateway: &dyn AppendGateway,
    diagnostics: &Diagnostics,
) -> Result<BTreeMap<ArtifactId, ArtifactId>, ResolveError> {
    let mut versions = BTreeMap::new();
    for (artifact, graph) in queue {
        if graph.is_empty() {
            tracing::debug!("nothing to append to {artifact}");
            continue;
        }
        let updated = gateway
            .append(&artifact, &graph)
            .await
            .map_err(|source| ResolveError::AppendFailed {
                artifact: artifact.clone(),
                source,
            })?;
        if updated == artifact {
            diagnostics.warn(Warning::UnchangedAppend { artifact });
            continue;
        }
        tracing::info!("appended {} triples to {artifact}, now {}", graph.len(), updated.version());
        versions.insert(artifact, updated);
    }
    Ok(versions)
}
