//! Error types for the graph model

/// Errors raised while building or decoding graphs
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// IRI failed validation
    #[error("invalid IRI {value:?}: {reason}")]
    InvalidIri {
        /// Offending text
        value: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// RDF/JSON document could not be parsed
    #[error("malformed RDF/JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// RDF/JSON object had an unknown `type`
    #[error("unsupported RDF/JSON object type: {0}")]
    UnsupportedObjectType(String),
}

impl GraphError {
    /// Shorthand for [`GraphError::InvalidIri`]
    #[inline]
    #[must_use]
    pub fn invalid_iri(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidIri {
            value: value.into(),
            reason,
        }
    }
}
