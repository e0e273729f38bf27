//! Error types for scenario ingestion.

use plant_core::CoreError;
use thiserror::Error;

/// Reasons a scenario could not be loaded.
///
/// Every variant is raised before the store is touched, so a failed load
/// always leaves the simulation exactly as it was.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read
    #[error("Could not read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid scenario JSON
    #[error("Malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document has no top-level `components` array
    #[error("Scenario has no \"components\" array")]
    MissingComponents,

    /// A record's type tag names no known component kind
    #[error("Record {index} has unknown type {kind:?}")]
    UnknownType { index: usize, kind: String },

    /// A parameter has the wrong type or an out-of-range value
    #[error("Record {id:?}: parameter {key:?} {reason}")]
    InvalidParam {
        id: String,
        key: String,
        reason: String,
    },

    /// The store rejected an insertion
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ScenarioError {
    /// Creates an invalid-parameter error.
    pub fn invalid_param(id: &str, key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            id: id.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
