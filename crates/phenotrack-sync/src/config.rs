//! Sync configuration

use crate::digest::Algorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where files come from, where they go, and how they are verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Every synced file must live under this directory
    pub local_root: PathBuf,
    /// Remote directory mirroring `local_root`
    pub remote_root: PathBuf,
    /// Sidecar digests written and verified for each file
    pub algorithms: Vec<Algorithm>,
    /// Files synced concurrently
    pub concurrency: usize,
}

impl SyncConfig {
    /// Create configuration for a root pair
    #[must_use]
    pub fn new(local_root: impl Into<PathBuf>, remote_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            remote_root: remote_root.into(),
            ..Self::default()
        }
    }

    /// With digest algorithms
    #[inline]
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms = algorithms.into_iter().collect();
        self
    }

    /// With file concurrency, clamped to at least one
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_root: PathBuf::from("."),
            remote_root: PathBuf::from("/"),
            algorithms: vec![Algorithm::Sha256],
            concurrency: 4,
        }
    }
}
