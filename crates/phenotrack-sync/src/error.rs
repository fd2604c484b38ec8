//! Error types for the sync engine
//!
//! Verification mismatches are not errors; they are repaired and reported
//! as outcomes. Only local I/O, transfer failures and the local-root
//! precondition abort a run.

use std::path::PathBuf;

/// Failures from a [`Transport`](crate::Transport)
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Remote path does not exist
    #[error("remote path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Any other I/O failure
    #[error("transport io error on {}: {source}", path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// Classify an I/O error, mapping `NotFound` to [`TransportError::NotFound`]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    /// True for a missing remote path
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Fatal sync failures
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// File to sync does not live under the local root
    #[error("{} is not under local root {}", path.display(), root.display())]
    OutsideLocalRoot {
        /// Offending file
        path: PathBuf,
        /// Declared local root
        root: PathBuf,
    },

    /// Reading or writing a local file failed
    #[error("local io error on {}: {source}", path.display())]
    LocalIo {
        /// Local path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A transfer step failed
    #[error("transfer of {} failed: {source}", path.display())]
    Transport {
        /// Remote path being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: TransportError,
    },
}

impl SyncError {
    /// Create local I/O error for path
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Create transfer error for a remote path
    pub fn transport(path: impl Into<PathBuf>, source: TransportError) -> Self {
        Self::Transport {
            path: path.into(),
            source,
        }
    }
}
