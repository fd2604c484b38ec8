//! Remote filesystem seam
//!
//! The engine enforces local-root containment itself; transports only
//! move bytes.

use crate::error::TransportError;
use async_trait::async_trait;
use std::path::Path;

/// Attributes of a remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    /// Size in bytes
    pub size: u64,
}

/// Minimal remote filesystem
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attributes of `remote`, [`TransportError::NotFound`] if absent
    async fn stat(&self, remote: &Path) -> Result<RemoteStat, TransportError>;

    /// Create `remote` and its parents; succeeds if it already exists
    async fn mkdirs(&self, remote: &Path) -> Result<(), TransportError>;

    /// Upload `local` to `remote`, overwriting
    async fn put(&self, local: &Path, remote: &Path) -> Result<(), TransportError>;

    /// Download `remote` into `local`, overwriting
    async fn get(&self, remote: &Path, local: &Path) -> Result<(), TransportError>;

    /// Delete `remote`
    async fn rm(&self, remote: &Path) -> Result<(), TransportError>;
}
