//! File digests and their sidecar files
//!
//! Each file is read once; every configured hasher is fed from the same
//! 64 KiB buffer. Digests are lowercase hex.

use crate::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::AsyncReadExt;

const CHUNK: usize = 64 * 1024;

/// File path to digest per algorithm, computed once per run
pub type DigestRecord = BTreeMap<PathBuf, BTreeMap<Algorithm, String>>;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
    /// BLAKE3
    Blake3,
}

impl Algorithm {
    /// Every algorithm
    pub const ALL: [Self; 3] = [Self::Sha256, Self::Sha512, Self::Blake3];

    /// Sidecar file extension, dot included
    #[inline]
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Sha256 => ".sha256",
            Self::Sha512 => ".sha512",
            Self::Blake3 => ".b3",
        }
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Sidecar path next to `file`
    #[must_use]
    pub fn sidecar(self, file: &Path) -> PathBuf {
        let mut name = file.as_os_str().to_os_string();
        name.push(self.extension());
        PathBuf::from(name)
    }

    fn hasher(self) -> Hasher {
        match self {
            Self::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            Self::Sha512 => Hasher::Sha512(sha2::Sha512::new()),
            Self::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown digest algorithm: {s}"))
    }
}

enum Hasher {
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Sha512(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Computes a [`DigestRecord`] for a set of files
#[async_trait]
pub trait DigestProvider: Send + Sync {
    /// Digest every file
    ///
    /// # Errors
    /// [`SyncError::LocalIo`] if a file cannot be read
    async fn digests(&self, files: &[PathBuf]) -> Result<DigestRecord, SyncError>;
}

/// Streaming [`DigestProvider`] over local files
#[derive(Debug, Clone)]
pub struct StreamingDigests {
    algorithms: Vec<Algorithm>,
}

impl StreamingDigests {
    /// Provider computing `algorithms`; duplicates are ignored
    #[must_use]
    pub fn new(algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        let mut algorithms: Vec<_> = algorithms.into_iter().collect();
        algorithms.sort();
        algorithms.dedup();
        Self { algorithms }
    }

    /// Configured algorithms
    #[inline]
    #[must_use]
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// Digest one file
    ///
    /// # Errors
    /// [`SyncError::LocalIo`] if the file cannot be read
    pub async fn digest_file(&self, path: &Path) -> Result<BTreeMap<Algorithm, String>, SyncError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| SyncError::local_io(path, e))?;
        let mut hashers: Vec<(Algorithm, Hasher)> = self.algorithms.iter().map(|a| (*a, a.hasher())).collect();
        let mut buf = vec![0u8; CHUNK];
        loop {
            let n = file.read(&mut buf).await.map_err(|e| SyncError::local_io(path, e))?;
            if n == 0 {
                break;
            }
            for (_, hasher) in &mut hashers {
                hasher.update(&buf[..n]);
            }
        }
        Ok(hashers.into_iter().map(|(a, h)| (a, h.finish())).collect())
    }
}

impl Default for StreamingDigests {
    fn default() -> Self {
        Self::new([Algorithm::Sha256])
    }
}

#[async_trait]
impl DigestProvider for StreamingDigests {
    async fn digests(&self, files: &[PathBuf]) -> Result<DigestRecord, SyncError> {
        let mut record = DigestRecord::new();
        for file in files {
            let digests = self.digest_file(file).await?;
            tracing::debug!("digested {} ({} algorithms)", file.display(), digests.len());
            record.insert(file.clone(), digests);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        tokio::fs::write(&path, b"abc").await.unwrap();

        let digests = StreamingDigests::new(Algorithm::ALL).digest_file(&path).await.unwrap();
        assert_eq!(
            digests[&Algorithm::Sha256],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(digests[&Algorithm::Sha512].starts_with("ddaf35a193617aba"));
        assert_eq!(digests[&Algorithm::Blake3], blake3::hash(b"abc").to_hex().to_string());
    }

    #[tokio::test]
    async fn large_file_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(CHUNK * 3 + 17)).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();

        let digests = StreamingDigests::new([Algorithm::Blake3]).digest_file(&path).await.unwrap();
        assert_eq!(digests[&Algorithm::Blake3], blake3::hash(&data).to_hex().to_string());
    }

    #[tokio::test]
    async fn missing_file_is_local_io() {
        let err = StreamingDigests::default()
            .digests(&[PathBuf::from("/definitely/not/here.zip")])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::LocalIo { .. }));
    }

    #[test]
    fn names_and_sidecars() {
        assert_eq!("SHA256".parse::<Algorithm>().unwrap(), Algorithm::Sha256);
        assert!("md5".parse::<Algorithm>().is_err());
        assert_eq!(
            Algorithm::Blake3.sidecar(Path::new("/bags/a.zip")),
            PathBuf::from("/bags/a.zip.b3")
        );
    }
}
