//! Ingest session: one tray-scan batch from header row to upload queue
//!
//! The session owns the run-scoped caches. The bulk pass runs once, on the
//! first batch; rows are then resolved concurrently and every row's triples
//! land in its project's change-set.

use crate::bulk::{BulkListResolver, BulkSummary};
use crate::changeset::{ChangeSetAccumulator, UploadQueue};
use crate::config::ResolverConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ResolveError;
use crate::gateway::QueryGateway;
use crate::header::HeaderMap;
use crate::identity::IdentityCache;
use crate::row::{RowOutcome, RowResolver};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Run-scoped ingest state
pub struct IngestSession {
    diagnostics: Arc<Diagnostics>,
    identity: IdentityCache,
    changes: ChangeSetAccumulator,
    gateway: Arc<dyn QueryGateway>,
    config: ResolverConfig,
    bulk: OnceCell<BulkSummary>,
}

impl IngestSession {
    /// Session with default configuration
    #[must_use]
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self::with_config(gateway, ResolverConfig::default())
    }

    /// Session with explicit configuration
    #[must_use]
    pub fn with_config(gateway: Arc<dyn QueryGateway>, config: ResolverConfig) -> Self {
        let diagnostics = Arc::new(Diagnostics::new());
        Self {
            identity: IdentityCache::new(Arc::clone(&diagnostics)),
            diagnostics,
            changes: ChangeSetAccumulator::new(),
            gateway,
            config,
            bulk: OnceCell::new(),
        }
    }

    /// Run the bulk pass if it has not run yet
    ///
    /// # Errors
    /// Propagates gateway failures from the listing or per-project queries.
    pub async fn prepare(&self) -> Result<BulkSummary, ResolveError> {
        let identity = &self.identity;
        let diagnostics = &*self.diagnostics;
        let gateway = &*self.gateway;
        self.bulk
            .get_or_try_init(|| async move { BulkListResolver::new(identity, diagnostics).run(gateway).await })
            .await
            .copied()
    }

    /// Resolve one batch of rows
    ///
    /// Rows are numbered from 1. The first fatal error aborts the batch;
    /// change-sets already merged by finished rows are kept.
    ///
    /// # Errors
    /// - header errors from [`HeaderMap::new`]
    /// - [`ResolveError::NoValidRows`] if `rows` is empty
    /// - any row failure, e.g. [`ResolveError::UnknownProject`]
    pub async fn process<H, R, S>(&self, headers: &[H], rows: &[R]) -> Result<Vec<RowOutcome>, ResolveError>
    where
        H: AsRef<str>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let header = HeaderMap::new(headers)?;
        if rows.is_empty() {
            return Err(ResolveError::NoValidRows);
        }
        self.prepare().await?;

        let resolver = RowResolver::new(&self.identity, &self.changes, &self.diagnostics, &*self.gateway);
        let records: Vec<_> = rows
            .iter()
            .enumerate()
            .map(|(idx, fields)| (idx + 1, header.record(idx + 1, fields.as_ref(), &self.diagnostics)))
            .collect();

        let mut outcomes: Vec<RowOutcome> = stream::iter(records.iter())
            .map(|(row, record)| resolver.resolve(*row, record))
            .buffer_unordered(self.config.row_concurrency.max(1))
            .try_collect()
            .await?;
        outcomes.sort_by_key(|o| o.row);

        tracing::info!(
            "resolved {} rows into {} change-sets ({} identities cached)",
            outcomes.len(),
            self.changes.len(),
            self.identity.len()
        );
        Ok(outcomes)
    }

    /// Identity cache
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    /// Change-sets so far
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &ChangeSetAccumulator {
        &self.changes
    }

    /// Shared warning log
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Hand off the upload queue and every warning raised
    #[must_use]
    pub fn finish(self) -> (UploadQueue, Vec<Warning>) {
        let warnings = self.diagnostics.take();
        (self.changes.into_queue(), warnings)
    }
}

impl std::fmt::Debug for IngestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestSession")
            .field("identities", &self.identity.len())
            .field("change_sets", &self.changes.len())
            .field("warnings", &self.diagnostics.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
