//! Phenotrack Resolve - tray-scan ingest and identity resolution
//!
//! Turns rows of a tray-scan spreadsheet into graph change-sets:
//! - Pre-populates project, experiment and genotype identities in bulk
//! - Resolves tray, pot, genotype and material identities per row
//! - Mints provisional identifiers for anything not found remotely
//! - Accumulates one change-set per owning project artifact
//! - Appends finished change-sets through the remote service
//!
//! # Example
//!
//! ```rust,ignore
//! use phenotrack_resolve::{publish, IngestSession, ResolverConfig};
//! use std::sync::Arc;
//!
//! # async fn example(gateway: Arc<MyGateway>) -> Result<(), Box<dyn std::error::Error>> {
//! let session = IngestSession::with_config(gateway.clone(), ResolverConfig::new().with_row_concurrency(4));
//! let outcomes = session.process(&headers, &rows).await?;
//! println!("resolved {} rows", outcomes.len());
//!
//! let diagnostics = Arc::clone(session.diagnostics());
//! let (queue, warnings) = session.finish();
//! let versions = publish(queue, gateway.as_ref(), &diagnostics).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod bulk;
pub mod cache;
pub mod changeset;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod header;
pub mod identity;
pub mod ingest;
pub mod labels;
pub mod line_map;
pub mod publish;
pub mod row;

pub use bulk::{genotype_key, BulkListResolver, BulkSummary};
pub use cache::{CacheStats, RunCache};
pub use changeset::{ChangeSet, ChangeSetAccumulator, UploadQueue};
pub use config::ResolverConfig;
pub use diagnostics::{Diagnostics, SkipReason, Warning};
pub use error::{GatewayError, ResolveError};
pub use gateway::{AppendGateway, QueryGateway, QueryPattern};
pub use header::{known_headers, ControlFlag, HeaderMap, TrayScanRecord, REQUIRED_HEADERS};
pub use identity::{EntityRecord, IdentityCache, IdentityKey, Minted, Probe, ResolveRequest, Selector};
pub use ingest::IngestSession;
pub use labels::{experiment_key, project_key, ExperimentLabel, ProjectLabel};
pub use line_map::{LineNameMapping, LINE_MAPPING_HEADERS};
pub use publish::publish;
pub use row::{RowOutcome, RowResolver};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running an ingest
    pub use crate::{
        publish, AppendGateway, IngestSession, QueryGateway, ResolveError, ResolverConfig, UploadQueue,
        Warning,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
