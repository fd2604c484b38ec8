//! Sync engine: make a remote tree match local files
//!
//! Per file, the content is checked by size and each sidecar digest is
//! checked byte for byte:
//!
//! | remote content      | action         |
//! |---------------------|----------------|
//! | absent or empty     | mkdirs + put   |
//! | size differs        | rm + put       |
//! | size matches        | nothing        |
//!
//! | remote sidecar                      | action       |
//! |-------------------------------------|--------------|
//! | cannot be downloaded                | mkdirs + put |
//! | zero or several lines, or differs   | rm + put     |
//! | one line equal to the local digest  | nothing      |
//!
//! An empty local file is always uploaded again. Every file is checked
//! against the local root before anything is transferred. A second run over
//! unchanged, non-empty files transfers nothing.

use crate::config::SyncConfig;
use crate::digest::{Algorithm, DigestProvider, DigestRecord};
use crate::error::SyncError;
use crate::transport::Transport;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// What happened to a content file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOutcome {
    /// Remote was absent; uploaded
    Uploaded,
    /// Remote size differed; deleted and uploaded
    Replaced {
        /// Local size
        local: u64,
        /// Size found remotely
        remote: u64,
    },
    /// Remote size matched; left alone
    SizeMatch,
}

/// What happened to one sidecar digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    /// Remote sidecar was absent; uploaded
    Uploaded,
    /// Remote sidecar was wrong; deleted and uploaded
    Replaced,
    /// Remote sidecar matched
    Verified,
}

/// Result for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Local file
    pub local: PathBuf,
    /// Remote file
    pub remote: PathBuf,
    /// Content file result
    pub content: ContentOutcome,
    /// Sidecar results
    pub digests: BTreeMap<Algorithm, DigestOutcome>,
    /// No digest was available for this file
    pub missing_digests: bool,
}

impl FileOutcome {
    /// Number of uploads performed for this file
    #[must_use]
    pub fn transfers(&self) -> usize {
        let content = usize::from(!matches!(self.content, ContentOutcome::SizeMatch));
        content
            + self
                .digests
                .values()
                .filter(|d| !matches!(d, DigestOutcome::Verified))
                .count()
    }
}

/// Result of one sync run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// One entry per file
    pub files: Vec<FileOutcome>,
}

impl SyncReport {
    /// Total uploads
    #[must_use]
    pub fn transfers(&self) -> usize {
        self.files.iter().map(FileOutcome::transfers).sum()
    }

    /// Files whose content was already correct
    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.files.iter().filter(|f| f.transfers() == 0).count()
    }

    /// Outcome for a local file
    #[must_use]
    pub fn get(&self, local: &Path) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.local == local)
    }
}

/// Where one file goes
#[derive(Debug, Clone)]
struct Plan {
    local: PathBuf,
    remote_dir: PathBuf,
    remote: PathBuf,
}

/// Remote state of a content file before any action
enum RemoteState {
    Absent,
    SizeMatch,
    SizeMismatch { local: u64, remote: u64 },
}

/// Sidecar state before any action
enum SidecarState {
    Absent,
    Mismatch,
    Verified,
}

/// Drives a [`Transport`] to mirror local files
pub struct SyncEngine {
    transport: Arc<dyn Transport>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Engine over `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: SyncConfig) -> Self {
        Self { transport, config }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Digest `files` with `provider`, then sync them
    ///
    /// # Errors
    /// As [`SyncEngine::sync`], plus digest failures
    pub async fn sync_with(
        &self,
        files: &[PathBuf],
        provider: &dyn DigestProvider,
    ) -> Result<SyncReport, SyncError> {
        // reject before spending time on digests
        self.plan(files)?;
        let digests = provider.digests(files).await?;
        self.sync(files, &digests).await
    }

    /// Sync `files` using precomputed digests
    ///
    /// # Errors
    /// - [`SyncError::OutsideLocalRoot`] before any transfer if a file is
    ///   outside the local root
    /// - [`SyncError::LocalIo`] if a local file or sidecar cannot be used
    /// - [`SyncError::Transport`] if a transfer step fails; files already
    ///   synced stay synced
    pub async fn sync(&self, files: &[PathBuf], digests: &DigestRecord) -> Result<SyncReport, SyncError> {
        let plans = self.plan(files)?;
        let outcomes: Vec<FileOutcome> = stream::iter(plans)
            .map(|plan| async move {
                let file_digests = digests.get(&plan.local).cloned().unwrap_or_default();
                self.sync_file(plan, file_digests).await
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let report = SyncReport { files: outcomes };
        tracing::info!(
            "synced {} files: {} transfers, {} unchanged",
            report.files.len(),
            report.transfers(),
            report.unchanged()
        );
        Ok(report)
    }

    fn plan(&self, files: &[PathBuf]) -> Result<Vec<Plan>, SyncError> {
        let root = absolute(&self.config.local_root)?;
        files
            .iter()
            .map(|file| {
                let local = absolute(file)?;
                let outside = || SyncError::OutsideLocalRoot {
                    path: local.clone(),
                    root: root.clone(),
                };
                let relative = local.strip_prefix(&root).map_err(|_| outside())?;
                let name = relative.file_name().ok_or_else(outside)?;
                let remote_dir = match relative.parent() {
                    Some(parent) => self.config.remote_root.join(parent),
                    None => self.config.remote_root.clone(),
                };
                let remote = remote_dir.join(name);
                Ok(Plan {
                    local: file.clone(),
                    remote_dir,
                    remote,
                })
            })
            .collect()
    }

    async fn sync_file(&self, plan: Plan, digests: BTreeMap<Algorithm, String>) -> Result<FileOutcome, SyncError> {
        let content = match self.remote_state(&plan).await? {
            RemoteState::Absent => {
                self.mkdirs(&plan.remote_dir).await?;
                self.put(&plan.local, &plan.remote).await?;
                tracing::info!("uploaded {}", plan.remote.display());
                ContentOutcome::Uploaded
            }
            RemoteState::SizeMismatch { local, remote } => {
                tracing::warn!(
                    "remote {} has size {remote}, local has {local}; replacing",
                    plan.remote.display()
                );
                self.rm(&plan.remote).await?;
                self.put(&plan.local, &plan.remote).await?;
                ContentOutcome::Replaced { local, remote }
            }
            RemoteState::SizeMatch => {
                tracing::debug!("{} already present with matching size", plan.remote.display());
                ContentOutcome::SizeMatch
            }
        };

        let missing_digests = digests.is_empty();
        if missing_digests {
            tracing::error!("no digests were computed for {}", plan.local.display());
        }
        let mut outcomes = BTreeMap::new();
        for (algorithm, digest) in &digests {
            let outcome = self.sync_sidecar(&plan, *algorithm, digest).await?;
            outcomes.insert(*algorithm, outcome);
        }

        Ok(FileOutcome {
            local: plan.local,
            remote: plan.remote,
            content,
            digests: outcomes,
            missing_digests,
        })
    }

    async fn remote_state(&self, plan: &Plan) -> Result<RemoteState, SyncError> {
        let local = tokio::fs::metadata(&plan.local)
            .await
            .map_err(|e| SyncError::local_io(&plan.local, e))?
            .len();
        if local == 0 {
            tracing::error!("local file {} is empty, uploading it again", plan.local.display());
            return Ok(RemoteState::Absent);
        }
        match self.transport.stat(&plan.remote).await {
            Ok(stat) if stat.size == 0 => {
                tracing::warn!("remote {} is empty, treating as absent", plan.remote.display());
                Ok(RemoteState::Absent)
            }
            Ok(stat) if stat.size == local => Ok(RemoteState::SizeMatch),
            Ok(stat) => Ok(RemoteState::SizeMismatch {
                local,
                remote: stat.size,
            }),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!("stat of {} failed, treating as absent: {e}", plan.remote.display());
                }
                Ok(RemoteState::Absent)
            }
        }
    }

    async fn sync_sidecar(&self, plan: &Plan, algorithm: Algorithm, digest: &str) -> Result<DigestOutcome, SyncError> {
        let local = algorithm.sidecar(&plan.local);
        tokio::fs::write(&local, digest)
            .await
            .map_err(|e| SyncError::local_io(&local, e))?;
        let remote = algorithm.sidecar(&plan.remote);

        match self.sidecar_state(&remote, algorithm, digest).await? {
            SidecarState::Verified => {
                tracing::debug!("{} verified", remote.display());
                Ok(DigestOutcome::Verified)
            }
            SidecarState::Mismatch => {
                tracing::error!("remote digest {} does not match local digest, replacing", remote.display());
                self.rm(&remote).await?;
                self.put(&local, &remote).await?;
                Ok(DigestOutcome::Replaced)
            }
            SidecarState::Absent => {
                self.mkdirs(&plan.remote_dir).await?;
                self.put(&local, &remote).await?;
                tracing::info!("uploaded {}", remote.display());
                Ok(DigestOutcome::Uploaded)
            }
        }
    }

    async fn sidecar_state(&self, remote: &Path, algorithm: Algorithm, digest: &str) -> Result<SidecarState, SyncError> {
        let scratch = tempfile::Builder::new()
            .prefix("phenotrack-digest-")
            .suffix(algorithm.extension())
            .tempfile()
            .map_err(|e| SyncError::local_io(std::env::temp_dir(), e))?;

        if let Err(e) = self.transport.get(remote, scratch.path()).await {
            tracing::debug!("no remote digest at {}: {e}", remote.display());
            return Ok(SidecarState::Absent);
        }
        let text = tokio::fs::read_to_string(scratch.path())
            .await
            .map_err(|e| SyncError::local_io(scratch.path(), e))?;
        let mut lines = text.lines();
        Ok(match (lines.next(), lines.next()) {
            (Some(line), None) if line == digest => SidecarState::Verified,
            _ => SidecarState::Mismatch,
        })
    }

    async fn mkdirs(&self, remote: &Path) -> Result<(), SyncError> {
        self.transport
            .mkdirs(remote)
            .await
            .map_err(|e| SyncError::transport(remote, e))
    }

    async fn put(&self, local: &Path, remote: &Path) -> Result<(), SyncError> {
        self.transport
            .put(local, remote)
            .await
            .map_err(|e| SyncError::transport(remote, e))
    }

    async fn rm(&self, remote: &Path) -> Result<(), SyncError> {
        self.transport
            .rm(remote)
            .await
            .map_err(|e| SyncError::transport(remote, e))
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Absolute, lexically normalized path; nothing is resolved on disk
fn absolute(path: &Path) -> Result<PathBuf, SyncError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SyncError::local_io(path, e))?
            .join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
