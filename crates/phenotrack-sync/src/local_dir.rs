//! Transport onto a locally mounted directory
//!
//! Remote paths are absolute paths below the mount point, so
//! `/bags/2013/a.zip` lands at `<mount>/bags/2013/a.zip`.

use crate::error::TransportError;
use crate::transport::{RemoteStat, Transport};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// [`Transport`] backed by `tokio::fs` under a mount directory
#[derive(Debug, Clone)]
pub struct LocalDirTransport {
    mount: PathBuf,
}

impl LocalDirTransport {
    /// Transport rooted at `mount`
    #[must_use]
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self { mount: mount.into() }
    }

    /// Mount directory
    #[inline]
    #[must_use]
    pub fn mount(&self) -> &Path {
        &self.mount
    }

    /// Where a remote path lives on disk
    ///
    /// Root, prefix and `.` components are dropped and `..` never climbs
    /// above the mount.
    #[must_use]
    pub fn resolve(&self, remote: &Path) -> PathBuf {
        let mut out = self.mount.clone();
        let mut depth = 0usize;
        for component in remote.components() {
            match component {
                Component::Normal(part) => {
                    out.push(part);
                    depth += 1;
                }
                Component::ParentDir if depth > 0 => {
                    out.pop();
                    depth -= 1;
                }
                _ => {}
            }
        }
        out
    }
}

#[async_trait]
impl Transport for LocalDirTransport {
    async fn stat(&self, remote: &Path) -> Result<RemoteStat, TransportError> {
        let path = self.resolve(remote);
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| TransportError::io(remote, e))?;
        if !meta.is_file() {
            return Err(TransportError::NotFound(remote.to_path_buf()));
        }
        Ok(RemoteStat { size: meta.len() })
    }

    async fn mkdirs(&self, remote: &Path) -> Result<(), TransportError> {
        tokio::fs::create_dir_all(self.resolve(remote))
            .await
            .map_err(|e| TransportError::io(remote, e))
    }

    async fn put(&self, local: &Path, remote: &Path) -> Result<(), TransportError> {
        tokio::fs::copy(local, self.resolve(remote))
            .await
            .map(|_| ())
            .map_err(|e| TransportError::io(remote, e))
    }

    async fn get(&self, remote: &Path, local: &Path) -> Result<(), TransportError> {
        tokio::fs::copy(self.resolve(remote), local)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::io(remote, e))
    }

    async fn rm(&self, remote: &Path) -> Result<(), TransportError> {
        tokio::fs::remove_file(self.resolve(remote))
            .await
            .map_err(|e| TransportError::io(remote, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remote_paths_stay_under_mount() {
        let t = LocalDirTransport::new("/mnt/remote");
        assert_eq!(t.resolve(Path::new("/bags/a.zip")), PathBuf::from("/mnt/remote/bags/a.zip"));
        assert_eq!(t.resolve(Path::new("/../../etc/passwd")), PathBuf::from("/mnt/remote/etc/passwd"));
        assert_eq!(t.resolve(Path::new("bags/./x/../a.zip")), PathBuf::from("/mnt/remote/bags/a.zip"));
    }

    proptest! {
        #[test]
        fn no_remote_path_escapes_the_mount(
            segments in prop::collection::vec(prop_oneof![Just("..".to_string()), Just(".".to_string()), "[a-z]{1,4}"], 0..12),
            absolute in any::<bool>(),
        ) {
            let mount = PathBuf::from("/mnt/remote");
            let t = LocalDirTransport::new(&mount);
            let joined = segments.join("/");
            let remote = if absolute { format!("/{joined}") } else { joined };
            let resolved = t.resolve(Path::new(&remote));
            prop_assert!(resolved.starts_with(&mount));
            prop_assert!(resolved.components().all(|c| !matches!(c, Component::ParentDir | Component::CurDir)));
        }
    }

    #[tokio::test]
    async fn round_trip_on_disk() {
        let mount = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let local = scratch.path().join("a.zip");
        tokio::fs::write(&local, b"payload").await.unwrap();

        let t = LocalDirTransport::new(mount.path());
        let remote = Path::new("/bags/2013/a.zip");
        assert!(t.stat(remote).await.unwrap_err().is_not_found());

        t.mkdirs(Path::new("/bags/2013")).await.unwrap();
        t.mkdirs(Path::new("/bags/2013")).await.unwrap();
        t.put(&local, remote).await.unwrap();
        assert_eq!(t.stat(remote).await.unwrap().size, 7);

        let back = scratch.path().join("back.zip");
        t.get(remote, &back).await.unwrap();
        assert_eq!(tokio::fs::read(&back).await.unwrap(), b"payload");

        t.rm(remote).await.unwrap();
        assert!(t.rm(remote).await.unwrap_err().is_not_found());
    }
}
