//! Error taxonomy for the model lifecycle
//!
//! Callers match on [`ReadinessError`] to decide whether a failure is the
//! client's fault (bad input) or the service's.

use std::path::PathBuf;
use thiserror::Error;

/// Input did not satisfy the feature schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<String> },

    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidType { field: String, reason: String },

    #[error("Invalid value in row {row} for column '{field}': {reason}")]
    InvalidCell {
        row: usize,
        field: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Dataset contains no usable rows")]
    EmptyDataset,

    #[error("Malformed CSV: {0}")]
    MalformedCsv(#[from] csv::Error),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Model artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model artifact {path:?} is invalid: {reason}")]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ReadinessError {
    /// True when the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReadinessError::Schema(_)
                | ReadinessError::EmptyDataset
                | ReadinessError::MalformedCsv(_)
        )
    }

    pub(crate) fn training(reason: impl Into<String>) -> Self {
        ReadinessError::Training(reason.into())
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ReadinessError::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadinessError>;
