//! Persisted model artifacts
//!
//! Each artifact is a bincode envelope carrying the model kind, the
//! feature schema it was trained with, a SHA256 checksum and the opaque
//! model payload. Loading rejects any envelope whose kind, schema or
//! checksum does not match.

use crate::error::{AqiError, Result};
use crate::models::FEATURE_COLUMNS;
use crate::regressor::{ModelKind, Regressor, TrainedModel};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk wrapper around a model payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub kind: ModelKind,
    pub feature_columns: Vec<String>,
    pub n_records: usize,
    pub trained_at: i64,
    pub checksum: String,
    pub payload: Vec<u8>,
}

/// A model together with what it was trained on
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub model: TrainedModel,
    pub n_records: usize,
    pub trained_at: i64,
}

impl ModelArtifact {
    pub fn new(model: TrainedModel, n_records: usize) -> Self {
        Self {
            model,
            n_records,
            trained_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }
}

/// Directory holding one artifact file per model kind
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: ModelKind) -> PathBuf {
        self.dir.join(kind.artifact_name())
    }

    /// Load and validate the artifact for `kind`
    pub fn load(&self, kind: ModelKind) -> Result<ModelArtifact> {
        let path = self.path_for(kind);
        if !path.exists() {
            return Err(AqiError::artifact(&path, "file not found"));
        }

        let bytes = fs::read(&path).map_err(|e| AqiError::storage(&path, e))?;
        let envelope: ArtifactEnvelope = bincode::deserialize(&bytes)
            .map_err(|e| AqiError::artifact(&path, format!("corrupt envelope: {}", e)))?;

        if envelope.kind != kind {
            return Err(AqiError::artifact(
                &path,
                format!("holds a {} model, expected {}", envelope.kind, kind),
            ));
        }
        if !schema_matches(&envelope.feature_columns) {
            return Err(AqiError::artifact(
                &path,
                format!(
                    "feature schema {:?} does not match {:?}",
                    envelope.feature_columns, FEATURE_COLUMNS
                ),
            ));
        }

        let computed = compute_checksum(&envelope.payload);
        if computed != envelope.checksum {
            return Err(AqiError::artifact(
                &path,
                format!("checksum mismatch: expected {}, got {}", envelope.checksum, computed),
            ));
        }

        let model = TrainedModel::from_payload(kind, &envelope.payload)
            .map_err(|e| AqiError::artifact(&path, format!("corrupt payload: {}", e)))?;

        debug!(
            kind = %kind,
            path = %path.display(),
            n_records = envelope.n_records,
            "Artifact validated"
        );

        Ok(ModelArtifact {
            model,
            n_records: envelope.n_records,
            trained_at: envelope.trained_at,
        })
    }

    /// Persist an artifact, replacing any previous file atomically
    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        let kind = artifact.kind();
        let path = self.path_for(kind);

        fs::create_dir_all(&self.dir).map_err(|e| AqiError::storage(&self.dir, e))?;

        let payload = artifact.model.to_payload()?;
        let envelope = ArtifactEnvelope {
            kind,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            n_records: artifact.n_records,
            trained_at: artifact.trained_at,
            checksum: compute_checksum(&payload),
            payload,
        };
        let bytes = bincode::serialize(&envelope)
            .map_err(|e| AqiError::artifact(&path, format!("serialization failed: {}", e)))?;

        write_atomic(&path, &bytes)?;

        info!(
            kind = %kind,
            path = %path.display(),
            size = bytes.len(),
            checksum = %envelope.checksum,
            "Model artifact saved"
        );
        Ok(path)
    }
}

fn schema_matches(columns: &[String]) -> bool {
    columns.len() == FEATURE_COLUMNS.len()
        && columns.iter().zip(FEATURE_COLUMNS.iter()).all(|(a, b)| a == b)
}

/// Write to a temp file first, then rename to the final path
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(|e| AqiError::storage(&temp_path, e))?;

    let written = file.write_all(bytes).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(AqiError::storage(&temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AqiError::storage(path, e)
    })
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"model payload");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"model payload"));
        assert_ne!(checksum, compute_checksum(b"other payload"));
    }

    #[test]
    fn test_schema_matches_only_exact_order() {
        let exact: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(schema_matches(&exact));

        let mut swapped = exact.clone();
        swapped.swap(4, 5);
        assert!(!schema_matches(&swapped));
        assert!(!schema_matches(&exact[..5]));
    }
}
