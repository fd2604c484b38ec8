//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Ingest tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Rows resolved concurrently
    pub row_concurrency: usize,
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With row concurrency, clamped to at least one
    #[inline]
    #[must_use]
    pub fn with_row_concurrency(mut self, n: usize) -> Self {
        self.row_concurrency = n.max(1);
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { row_concurrency: 8 }
    }
}
