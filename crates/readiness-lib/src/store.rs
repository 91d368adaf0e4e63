//! Durable storage for the active model artifact
//!
//! The artifact is a JSON envelope holding the model document and a SHA256
//! checksum over its exact bytes. Writes go to a sibling temp file which is
//! synced and then renamed over the target, so readers only ever see a
//! complete artifact.

use crate::error::{ReadinessError, Result};
use crate::model::TrainedModel;
use crate::schema::feature_names;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    model: Box<RawValue>,
}

/// Single-artifact model store
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and verify the persisted artifact
    pub fn load(&self) -> Result<TrainedModel> {
        let bytes = fs::read(&self.path)?;

        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| ReadinessError::corrupt(&self.path, format!("not a model envelope: {}", e)))?;

        let computed = compute_checksum(envelope.model.get().as_bytes());
        if computed != envelope.checksum {
            return Err(ReadinessError::corrupt(
                &self.path,
                format!(
                    "checksum mismatch: expected {}, got {}",
                    envelope.checksum, computed
                ),
            ));
        }

        let model: TrainedModel = serde_json::from_str(envelope.model.get())
            .map_err(|e| ReadinessError::corrupt(&self.path, format!("invalid model document: {}", e)))?;

        if model.metadata.feature_order != feature_names() {
            return Err(ReadinessError::corrupt(
                &self.path,
                format!(
                    "feature order {:?} does not match {:?}",
                    model.metadata.feature_order,
                    feature_names()
                ),
            ));
        }

        info!(
            version = %model.version(),
            path = %self.path.display(),
            checksum = %computed,
            "Loaded model artifact"
        );

        Ok(model)
    }

    /// Atomically replace the persisted artifact
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let document = serde_json::to_string(model).map_err(std::io::Error::from)?;
        let checksum = compute_checksum(document.as_bytes());
        let envelope = Envelope {
            checksum: checksum.clone(),
            model: RawValue::from_string(document).map_err(std::io::Error::from)?,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(std::io::Error::from)?;

        let temp_path = self.temp_path();
        let write_result = (|| -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(
            version = %model.version(),
            path = %self.path.display(),
            checksum = %checksum,
            size = bytes.len(),
            "Model artifact written"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::LogisticModel;
    use tempfile::TempDir;

    fn test_model(bias: f64) -> TrainedModel {
        TrainedModel::new(
            LogisticModel {
                coefficients: vec![0.9, 0.4, 0.3, 0.2, 0.1, 0.7],
                intercept: bias,
                feature_means: vec![7.0, 3.0, 2.0, 0.5, 80.0, 65.0],
                feature_scales: vec![1.5, 1.2, 1.4, 0.5, 10.0, 15.0],
            },
            "logistic_regression",
            Some(0.85),
            40,
        )
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"model document");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"model document"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"));
        let model = test_model(0.25);

        store.save(&model).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_save_replaces_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"));

        store.save(&test_model(0.1)).unwrap();
        let second = test_model(-0.3);
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap().version(), second.version());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(ReadinessError::Io(_))));
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"));
        store.save(&test_model(0.5)).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        fs::write(store.path(), text.replace("0.85", "0.99")).unwrap();

        assert!(matches!(
            store.load(),
            Err(ReadinessError::CorruptArtifact { .. })
        ));
    }

    #[test]
    fn test_truncated_artifact_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"));
        store.save(&test_model(0.5)).unwrap();

        let bytes = fs::read(store.path()).unwrap();
        fs::write(store.path(), &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(
            store.load(),
            Err(ReadinessError::CorruptArtifact { .. })
        ));
    }

    #[test]
    fn test_foreign_feature_order_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"));
        let mut model = test_model(0.5);
        model.metadata.feature_order.swap(0, 1);
        store.save(&model).unwrap();

        assert!(matches!(
            store.load(),
            Err(ReadinessError::CorruptArtifact { .. })
        ));
    }

    #[test]
    fn test_save_into_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("missing").join("model.json"));
        assert!(matches!(store.save(&test_model(0.0)), Err(ReadinessError::Io(_))));
    }
}
