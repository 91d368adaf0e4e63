//! The servable model: fitted parameters plus provenance

use crate::error::Result;
use crate::estimator::LogisticModel;
use crate::schema::{feature_names, FeatureVector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance recorded alongside the fitted parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Content hash of the fitted parameters
    pub version: String,
    pub algorithm: String,
    /// Held-out accuracy, absent for artifacts produced elsewhere
    pub accuracy: Option<f64>,
    pub trained_at: i64,
    pub training_rows: usize,
    /// Feature order the parameters were fitted against
    pub feature_order: Vec<String>,
}

/// A model that can be promoted to active and persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    pub classifier: LogisticModel,
}

impl TrainedModel {
    pub fn new(
        classifier: LogisticModel,
        algorithm: &str,
        accuracy: Option<f64>,
        training_rows: usize,
    ) -> Self {
        Self {
            metadata: ModelMetadata {
                version: parameter_version(&classifier),
                algorithm: algorithm.to_string(),
                accuracy,
                trained_at: chrono::Utc::now().timestamp(),
                training_rows,
                feature_order: feature_names(),
            },
            classifier,
        }
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        self.classifier.predict_proba(&features.to_array())
    }
}

/// Short, stable identifier derived from the fitted parameters.
///
/// Identical training input yields identical parameters and thus the same
/// version string.
fn parameter_version(classifier: &LogisticModel) -> String {
    let mut hasher = Sha256::new();
    for value in classifier
        .coefficients
        .iter()
        .chain(std::iter::once(&classifier.intercept))
        .chain(&classifier.feature_means)
        .chain(&classifier.feature_scales)
    {
        hasher.update(value.to_le_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    format!("lr-{}", &digest[..12])
}
