//! Lifecycle orchestration: serve predictions and run retrains
//!
//! A retrain parses and fits on the blocking pool, then commits the candidate
//! by saving it and promoting it under a single commit lock. The commit runs
//! as a detached task, so dropping the caller's future after the commit
//! starts never leaves a saved-but-unpromoted artifact or stale health.

use crate::dataset::Dataset;
use crate::error::{ReadinessError, Result};
use crate::estimator::{Estimator, LogisticRegression};
use crate::health::{components, HealthRegistry};
use crate::inference::{InferenceEngine, PredictionResponse, ResponseMode};
use crate::model::{ModelMetadata, TrainedModel};
use crate::observability::{outcomes, ServiceMetrics, StructuredLogger};
use crate::registry::ModelRegistry;
use crate::schema::validate_and_order;
use crate::store::ModelStore;
use crate::trainer::{SplitConfig, Trainer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::error;

pub const RETRAIN_SUCCESS_MESSAGE: &str = "Model retrained successfully";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub response_mode: ResponseMode,
    pub split: SplitConfig,
    pub instance: String,
}

/// Summary of a promoted retrain
#[derive(Debug, Clone, Serialize)]
pub struct RetrainReport {
    pub message: String,
    pub accuracy: f64,
    pub version: String,
    pub previous_version: String,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub struct ReadinessService {
    registry: Arc<ModelRegistry>,
    store: Arc<ModelStore>,
    trainer: Trainer,
    engine: InferenceEngine,
    commit_lock: Arc<Mutex<()>>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
    health: HealthRegistry,
}

impl ReadinessService {
    /// Load the persisted artifact and start serving it.
    ///
    /// Fails if the artifact is missing or invalid; there is no fallback model.
    pub async fn open(config: ServiceConfig) -> Result<Self> {
        Self::open_with_estimator(config, Arc::new(LogisticRegression::default())).await
    }

    pub async fn open_with_estimator(
        config: ServiceConfig,
        estimator: Arc<dyn Estimator>,
    ) -> Result<Self> {
        let store = Arc::new(ModelStore::new(config.model_path));
        let initial = store.load()?;

        let metrics = ServiceMetrics::new();
        metrics.set_active_model(
            initial.version(),
            &initial.metadata.algorithm,
            initial.metadata.accuracy,
        );

        let registry = Arc::new(ModelRegistry::new(initial));
        let health = HealthRegistry::new();
        health.register_lifecycle_components().await;
        health.set_ready(true).await;

        Ok(Self {
            engine: InferenceEngine::new(registry.clone(), config.response_mode),
            trainer: Trainer::new(estimator, config.split),
            registry,
            store,
            commit_lock: Arc::new(Mutex::new(())),
            metrics,
            logger: StructuredLogger::new(config.instance),
            health,
        })
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.engine.mode()
    }

    pub fn active_model(&self) -> Arc<TrainedModel> {
        self.registry.get_active()
    }

    pub fn model_info(&self) -> ModelMetadata {
        self.registry.get_active().metadata.clone()
    }

    /// Validate a raw feature record and score it against the active model
    pub fn predict(&self, record: &Map<String, Value>) -> Result<PredictionResponse> {
        let start = Instant::now();
        let features = validate_and_order(record)?;

        match self.engine.respond(&features) {
            Ok((prediction, response)) => {
                self.metrics
                    .observe_prediction(start.elapsed().as_secs_f64());
                self.logger.log_prediction(
                    prediction.probability,
                    prediction.label,
                    &prediction.model_version,
                );
                Ok(response)
            }
            Err(e) => {
                self.metrics.inc_prediction_errors();
                error!(error = %e, "Active model failed to score request");
                Err(e)
            }
        }
    }

    /// Parse an uploaded CSV body and retrain on it
    pub async fn retrain_csv(&self, body: Vec<u8>) -> Result<RetrainReport> {
        let start = Instant::now();
        self.logger.log_retrain_started("csv_upload", None);

        let parsed = tokio::task::spawn_blocking(move || Dataset::from_csv_bytes(&body))
            .await
            .map_err(|e| ReadinessError::training(format!("CSV parsing task aborted: {}", e)))
            .and_then(|dataset| dataset);

        match parsed {
            Ok(dataset) => self.fit_and_commit(dataset, start).await,
            Err(e) => {
                self.record_failure(&e, start);
                Err(e)
            }
        }
    }

    /// Fit a candidate and, if that succeeds, persist and promote it
    pub async fn retrain(&self, dataset: Dataset) -> Result<RetrainReport> {
        let start = Instant::now();
        self.logger.log_retrain_started("dataset", Some(dataset.len()));
        self.fit_and_commit(dataset, start).await
    }

    async fn fit_and_commit(&self, dataset: Dataset, start: Instant) -> Result<RetrainReport> {
        let trainer = self.trainer.clone();
        let fitted = tokio::task::spawn_blocking(move || trainer.retrain(&dataset))
            .await
            .map_err(|e| ReadinessError::training(format!("training task aborted: {}", e)))
            .and_then(|outcome| outcome);

        let outcome = match fitted {
            Ok(outcome) => {
                self.health.set_healthy(components::TRAINER).await;
                outcome
            }
            Err(e) => {
                if !e.is_client_error() {
                    self.health
                        .set_degraded(components::TRAINER, e.to_string())
                        .await;
                }
                self.record_failure(&e, start);
                return Err(e);
            }
        };

        let accuracy = outcome.accuracy;
        let version = outcome.model.version().to_string();
        let previous = self.commit(outcome.model, start).await?;

        Ok(RetrainReport {
            message: RETRAIN_SUCCESS_MESSAGE.to_string(),
            accuracy,
            version,
            previous_version: previous.version().to_string(),
            train_rows: outcome.train_rows,
            test_rows: outcome.test_rows,
        })
    }

    /// Save then promote, serialized against other commits.
    ///
    /// The commit and its health, metrics and log bookkeeping run on a
    /// detached task; dropping this future after the call leaves them running.
    /// Returns the model that was displaced.
    async fn commit(&self, candidate: TrainedModel, start: Instant) -> Result<Arc<TrainedModel>> {
        let committer = Committer {
            store: self.store.clone(),
            registry: self.registry.clone(),
            lock: self.commit_lock.clone(),
            metrics: self.metrics.clone(),
            logger: self.logger.clone(),
            health: self.health.clone(),
        };

        tokio::spawn(committer.run(candidate, start))
            .await
            .map_err(|e| commit_aborted(&e))?
    }

    fn record_failure(&self, err: &ReadinessError, start: Instant) {
        record_failure(&self.metrics, &self.logger, &self.registry, err, start);
    }
}

/// Everything a commit touches, owned so it can outlive the request
#[derive(Clone)]
struct Committer {
    store: Arc<ModelStore>,
    registry: Arc<ModelRegistry>,
    lock: Arc<Mutex<()>>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
    health: HealthRegistry,
}

impl Committer {
    async fn run(self, candidate: TrainedModel, start: Instant) -> Result<Arc<TrainedModel>> {
        let committer = self.clone();
        let committed = tokio::task::spawn_blocking(move || committer.save_and_promote(candidate))
            .await
            .map_err(|e| commit_aborted(&e))
            .and_then(|result| result);

        match committed {
            Ok((previous, promoted)) => {
                self.health.set_healthy(components::MODEL_STORE).await;
                self.metrics
                    .observe_retrain(outcomes::PROMOTED, start.elapsed().as_secs_f64());
                self.logger.log_promotion(
                    previous.version(),
                    promoted.version(),
                    promoted.metadata.accuracy.unwrap_or(f64::NAN),
                );
                Ok(previous)
            }
            Err(e) => {
                self.health
                    .set_degraded(components::MODEL_STORE, e.to_string())
                    .await;
                record_failure(&self.metrics, &self.logger, &self.registry, &e, start);
                Err(e)
            }
        }
    }

    /// Returns the displaced model and the one now active
    fn save_and_promote(
        &self,
        candidate: TrainedModel,
    ) -> Result<(Arc<TrainedModel>, Arc<TrainedModel>)> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.store.save(&candidate)?;

        let candidate = Arc::new(candidate);
        let previous = self.registry.promote(candidate.clone());
        self.metrics.set_active_model(
            candidate.version(),
            &candidate.metadata.algorithm,
            candidate.metadata.accuracy,
        );
        Ok((previous, candidate))
    }
}

fn commit_aborted(err: &tokio::task::JoinError) -> ReadinessError {
    ReadinessError::Io(std::io::Error::other(format!(
        "commit task aborted: {}",
        err
    )))
}

fn record_failure(
    metrics: &ServiceMetrics,
    logger: &StructuredLogger,
    registry: &ModelRegistry,
    err: &ReadinessError,
    start: Instant,
) {
    let outcome = if err.is_client_error() {
        outcomes::REJECTED
    } else {
        outcomes::FAILED
    };
    metrics.observe_retrain(outcome, start.elapsed().as_secs_f64());
    logger.log_retrain_failure(
        &registry.active_version(),
        &err.to_string(),
        err.is_client_error(),
    );
}
