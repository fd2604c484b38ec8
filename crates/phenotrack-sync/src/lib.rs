//! Phenotrack Sync - verified, idempotent upload of artifact bundles
//!
//! Mirrors files under a local root into a remote directory tree. Content
//! files are checked by size; a sidecar digest per algorithm is checked
//! byte for byte. Re-running over unchanged files transfers nothing, so a
//! failed run is recovered by running again.
//!
//! # Example
//!
//! ```rust,ignore
//! use phenotrack_sync::{Algorithm, LocalDirTransport, StreamingDigests, SyncConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! # async fn example(files: Vec<std::path::PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::new("/data/bags", "/archive/bags")
//!     .with_algorithms([Algorithm::Sha256, Algorithm::Blake3]);
//! let digests = StreamingDigests::new(config.algorithms.clone());
//! let engine = SyncEngine::new(Arc::new(LocalDirTransport::new("/mnt/archive")), config);
//!
//! let report = engine.sync_with(&files, &digests).await?;
//! println!("{} transfers", report.transfers());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod local_dir;
pub mod transport;

pub use config::SyncConfig;
pub use digest::{Algorithm, DigestProvider, DigestRecord, StreamingDigests};
pub use engine::{ContentOutcome, DigestOutcome, FileOutcome, SyncEngine, SyncReport};
pub use error::{SyncError, TransportError};
pub use local_dir::LocalDirTransport;
pub use transport::{RemoteStat, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
