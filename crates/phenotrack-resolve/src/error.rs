//! Error types for identity resolution
//!
//! Everything here aborts the current batch. Recoverable conditions
//! (duplicates, ambiguous matches, short rows) are [`Warning`]s instead.
//!
//! [`Warning`]: crate::diagnostics::Warning

use phenotrack_graph::{ArtifactId, EntityKind, GraphError};

/// Failures reported by a remote query or append service
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure talking to the service
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with something we could not interpret
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Artifact is unknown to the service
    #[error("artifact not found: {0}")]
    NotFound(String),
}

/// Batch-fatal resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Row referenced a project that no unpublished artifact holds
    #[error("project {key:?} (row {row}) was not found among unpublished artifacts")]
    UnknownProject {
        /// Normalized project key
        key: String,
        /// 1-based data row number
        row: usize,
    },

    /// Row named an experiment that belongs to a different project
    #[error("experiment {experiment:?} (row {row}) does not belong to project {project:?}")]
    ExperimentOutsideProject {
        /// Normalized experiment key
        experiment: String,
        /// Normalized key of the row's project
        project: String,
        /// 1-based data row number
        row: usize,
    },

    /// Scoped entity resolved without its owning scope
    #[error("{kind} {key:?} cannot be resolved without an owning scope")]
    MissingScope {
        /// Entity kind
        kind: EntityKind,
        /// Natural key being resolved
        key: String,
    },

    /// Header row contained a column we do not understand
    #[error("unrecognised header {header:?}")]
    UnrecognisedHeader {
        /// The header label
        header: String,
    },

    /// Header row lacked required columns
    #[error("missing required headers: {}", missing.join(", "))]
    MissingHeaders {
        /// Every missing label
        missing: Vec<String>,
    },

    /// Line mapping table did not have exactly the expected two headers
    #[error("line mapping headers must be {expected:?}, found {found:?}")]
    InvalidLineMappingHeaders {
        /// Expected labels in order
        expected: [&'static str; 2],
        /// Labels actually present
        found: Vec<String>,
    },

    /// Input had no header row
    #[error("input has no header row")]
    NoHeader,

    /// Input had a header but no data rows
    #[error("input has no data rows")]
    NoValidRows,

    /// Appending a change-set failed
    #[error("append to {artifact} failed: {source}")]
    AppendFailed {
        /// Target artifact
        artifact: ArtifactId,
        /// Underlying failure
        #[source]
        source: GatewayError,
    },

    /// Remote query failed
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Graph construction failed
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

impl ResolveError {
    /// True if the batch failed because of its own content rather than the
    /// remote service
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownProject { .. }
                | Self::ExperimentOutsideProject { .. }
                | Self::MissingScope { .. }
                | Self::UnrecognisedHeader { .. }
                | Self::MissingHeaders { .. }
                | Self::InvalidLineMappingHeaders { .. }
                | Self::NoHeader
                | Self::NoValidRows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_headers_lists_all() {
        let err = ResolveError::MissingHeaders {
            missing: vec!["TrayID".into(), "PlantID".into()],
        };
        assert_eq!(err.to_string(), "missing required headers: TrayID, PlantID");
    }

    #[test]
    fn input_errors_are_distinguished_from_gateway_errors() {
        assert!(ResolveError::NoValidRows.is_input_error());
        assert!(ResolveError::UnknownProject {
            key: "Project#2013-0015".into(),
            row: 1
        }
        .is_input_error());
        assert!(!ResolveError::from(GatewayError::Network("reset".into())).is_input_error());
    }
}
