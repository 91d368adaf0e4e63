//! Placement readiness model lifecycle
//!
//! This crate provides:
//! - Feature schema validation and canonical ordering
//! - CSV dataset parsing and seeded train/test splitting
//! - Logistic regression training and held-out evaluation
//! - Checksummed, atomically replaced model artifacts
//! - An active-model registry with snapshot reads
//! - Health checks and observability

pub mod dataset;
pub mod error;
pub mod estimator;
pub mod health;
pub mod inference;
pub mod model;
pub mod observability;
pub mod registry;
pub mod schema;
pub mod service;
pub mod store;
pub mod trainer;

pub use dataset::Dataset;
pub use error::{ReadinessError, Result, SchemaError};
pub use estimator::{Estimator, LogisticModel, LogisticRegression};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use inference::{InferenceEngine, Prediction, PredictionResponse, ResponseMode};
pub use model::{ModelMetadata, TrainedModel};
pub use observability::{ServiceMetrics, StructuredLogger};
pub use registry::ModelRegistry;
pub use schema::{FeatureVector, LabeledRow};
pub use service::{ReadinessService, RetrainReport, ServiceConfig};
pub use store::ModelStore;
pub use trainer::{SplitConfig, Trainer, TrainingOutcome};
