use std::fmt;

use thiserror::Error;

use crate::dataset::DatasetKey;

/// Why a dataset could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a non-success status code
    Status(u16),
    /// The request could not be completed
    Network(String),
    /// The body was not valid JSON for the expected shape
    Decode(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Status(code) => write!(f, "HTTP {code}"),
            FailureReason::Network(msg) => write!(f, "network error: {msg}"),
            FailureReason::Decode(msg) => write!(f, "invalid JSON: {msg}"),
        }
    }
}

/// A failed fetch of one dataset. Carries the key for diagnostic display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load {key}: {reason}")]
pub struct FetchFailure {
    pub key: DatasetKey,
    pub reason: FailureReason,
}

impl FetchFailure {
    pub fn status(key: DatasetKey, code: u16) -> Self {
        Self { key, reason: FailureReason::Status(code) }
    }

    pub fn network(key: DatasetKey, msg: impl Into<String>) -> Self {
        Self { key, reason: FailureReason::Network(msg.into()) }
    }

    pub fn decode(key: DatasetKey, msg: impl Into<String>) -> Self {
        Self { key, reason: FailureReason::Decode(msg.into()) }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self.reason {
            FailureReason::Status(code) => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    #[error("Layer {layer} out of range (dataset has {n_layers} layers)")]
    InvalidLayer { layer: u32, n_layers: u32 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dataset {key} was already cached as a different type")]
    TypeMismatch { key: DatasetKey },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AtlasError {
    /// Dataset key involved in the failure, if any.
    pub fn key(&self) -> Option<&DatasetKey> {
        match self {
            AtlasError::Fetch(f) => Some(&f.key),
            AtlasError::TypeMismatch { key } => Some(key),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    #[test]
    fn test_fetch_failure_message_names_key_and_status() {
        let err = FetchFailure::status(Dataset::GlobalSummary.key(), 404);
        assert_eq!(err.to_string(), "Failed to load global_summary.json: HTTP 404");
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_network_failure_has_no_status() {
        let err = FetchFailure::network(Dataset::Modules.key(), "connection refused");
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_status_lives_in_reason() {
        let err = FetchFailure::status(Dataset::Modules.key(), 503);
        assert_eq!(err.reason, FailureReason::Status(503));
        assert_eq!(err.key.as_str(), "modules.json");

        let err = FetchFailure::decode(Dataset::Modules.key(), "expected array");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "Failed to load modules.json: invalid JSON: expected array");
    }

    #[test]
    fn test_atlas_error_exposes_key() {
        let err: AtlasError = FetchFailure::decode(Dataset::GeneIndex.key(), "eof").into();
        assert_eq!(err.key().map(|k| k.as_str()), Some("gene_index.json"));
        assert!(AtlasError::NotFound("feature 9".into()).key().is_none());
    }
}
