use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use phenotrack_sync::{RemoteStat, Transport, TransportError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts of each transport call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportOps {
    pub stat: usize,
    pub mkdirs: usize,
    pub put: usize,
    pub get: usize,
    pub rm: usize,
}

#[derive(Debug, Default)]
struct Counters {
    stat: AtomicUsize,
    mkdirs: AtomicUsize,
    put: AtomicUsize,
    get: AtomicUsize,
    rm: AtomicUsize,
}

/// Remote filesystem held in memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    files: DashMap<PathBuf, Vec<u8>>,
    dirs: DashSet<PathBuf>,
    counters: Counters,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a remote file directly, bypassing the counters
    pub fn seed(&self, remote: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(remote.into(), bytes.into());
    }

    pub fn contents(&self, remote: &Path) -> Option<Vec<u8>> {
        self.files.get(remote).map(|v| v.clone())
    }

    pub fn exists(&self, remote: &Path) -> bool {
        self.files.contains_key(remote)
    }

    pub fn has_dir(&self, remote: &Path) -> bool {
        self.dirs.contains(remote)
    }

    pub fn ops(&self) -> TransportOps {
        TransportOps {
            stat: self.counters.stat.load(Ordering::SeqCst),
            mkdirs: self.counters.mkdirs.load(Ordering::SeqCst),
            put: self.counters.put.load(Ordering::SeqCst),
            get: self.counters.get.load(Ordering::SeqCst),
            rm: self.counters.rm.load(Ordering::SeqCst),
        }
    }

    /// Zero the counters, keeping the files
    pub fn reset_ops(&self) {
        for c in [
            &self.counters.stat,
            &self.counters.mkdirs,
            &self.counters.put,
            &self.counters.get,
            &self.counters.rm,
        ] {
            c.store(0, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn stat(&self, remote: &Path) -> Result<RemoteStat, TransportError> {
        self.counters.stat.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(remote)
            .map(|bytes| RemoteStat {
                size: bytes.len() as u64,
            })
            .ok_or_else(|| TransportError::NotFound(remote.to_path_buf()))
    }

    async fn mkdirs(&self, remote: &Path) -> Result<(), TransportError> {
        self.counters.mkdirs.fetch_add(1, Ordering::SeqCst);
        for dir in remote.ancestors() {
            self.dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    async fn put(&self, local: &Path, remote: &Path) -> Result<(), TransportError> {
        self.counters.put.fetch_add(1, Ordering::SeqCst);
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|e| TransportError::io(local, e))?;
        self.files.insert(remote.to_path_buf(), bytes);
        Ok(())
    }

    async fn get(&self, remote: &Path, local: &Path) -> Result<(), TransportError> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .contents(remote)
            .ok_or_else(|| TransportError::NotFound(remote.to_path_buf()))?;
        tokio::fs::write(local, bytes)
            .await
            .map_err(|e| TransportError::io(local, e))
    }

    async fn rm(&self, remote: &Path) -> Result<(), TransportError> {
        self.counters.rm.fetch_add(1, Ordering::SeqCst);
        self.files
            .remove(remote)
            .map(|_| ())
            .ok_or_else(|| TransportError::NotFound(remote.to_path_buf()))
    }
}
