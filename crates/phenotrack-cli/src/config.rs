//! TOML configuration for the command-line front end
//!
//! ```toml
//! [resolver]
//! row_concurrency = 8
//!
//! [sync]
//! local_root = "/data/bags"
//! remote_root = "/archive/bags"
//! remote_mount = "/mnt/archive"
//! algorithms = ["sha256", "blake3"]
//! concurrency = 4
//! ```

use anyhow::Context;
use phenotrack_resolve::ResolverConfig;
use phenotrack_sync::SyncConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    pub(crate) resolver: ResolverConfig,
    pub(crate) sync: CliSyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct CliSyncConfig {
    #[serde(flatten)]
    pub(crate) engine: SyncConfig,
    /// Directory the remote tree is mounted at
    pub(crate) remote_mount: PathBuf,
}

impl Default for CliSyncConfig {
    fn default() -> Self {
        Self {
            engine: SyncConfig::default(),
            remote_mount: PathBuf::from("/"),
        }
    }
}

impl CliConfig {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        anyhow::ensure!(config.sync.engine.concurrency > 0, "sync.concurrency must be at least 1");
        anyhow::ensure!(
            config.resolver.row_concurrency > 0,
            "resolver.row_concurrency must be at least 1"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phenotrack_sync::Algorithm;

    #[test]
    fn full_file() {
        let config = CliConfig::parse(
            r#"
            [resolver]
            row_concurrency = 2

            [sync]
            local_root = "/data/bags"
            remote_root = "/archive/bags"
            remote_mount = "/mnt/archive"
            algorithms = ["sha256", "blake3"]
            "#,
        )
        .unwrap();
        assert_eq!(config.resolver.row_concurrency, 2);
        assert_eq!(config.sync.engine.local_root, PathBuf::from("/data/bags"));
        assert_eq!(config.sync.engine.algorithms, vec![Algorithm::Sha256, Algorithm::Blake3]);
        assert_eq!(config.sync.engine.concurrency, 4);
        assert_eq!(config.sync.remote_mount, PathBuf::from("/mnt/archive"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = CliConfig::parse("").unwrap();
        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.sync.engine, SyncConfig::default());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(CliConfig::parse("[sync]\nconcurrency = 0\n").is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phenotrack.toml");
        std::fs::write(&path, "[sync]\nremote_root = \"/r\"\n").unwrap();
        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.sync.engine.remote_root, PathBuf::from("/r"));
        assert!(CliConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
