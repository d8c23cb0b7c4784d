//! Error taxonomy shared by the dataset store, model registry, predictor
//! and measurement sources

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AqiError {
    /// Malformed or missing request fields
    #[error("invalid input: {0}")]
    Validation(String),

    /// The registry never reached the ready state
    #[error("models unavailable: {0}")]
    ModelUnavailable(String),

    /// Corpus or artifact file could not be read or written
    #[error("storage error at {}: {message}", path.display())]
    StorageIo { path: PathBuf, message: String },

    /// A persisted artifact exists but cannot be used
    #[error("unusable model artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    #[error("training failed: {0}")]
    Training(String),

    /// A measurement provider errored or timed out
    #[error("measurement source {provider} unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },
}

impl AqiError {
    pub fn storage(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        AqiError::StorageIo {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AqiError::Artifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(provider: &str, reason: impl std::fmt::Display) -> Self {
        AqiError::SourceUnavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AqiError>;
