//! Observability infrastructure for the readiness service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, retrain outcomes, active model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, Gauge, GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const PREDICTION_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1,
];

/// Histogram buckets for retrain duration (in seconds)
const RETRAIN_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    retrains_total: IntCounterVec,
    retrain_duration_seconds: Histogram,
    model_accuracy: Gauge,
    model_version_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "readiness_prediction_latency_seconds",
                "Time spent validating input and querying the active model",
                PREDICTION_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "readiness_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "readiness_prediction_errors_total",
                "Total number of predictions that failed inside the model"
            )
            .expect("Failed to register prediction_errors_total"),

            retrains_total: register_int_counter_vec!(
                "readiness_retrains_total",
                "Retrain attempts by outcome",
                &["outcome"]
            )
            .expect("Failed to register retrains_total"),

            retrain_duration_seconds: register_histogram!(
                "readiness_retrain_duration_seconds",
                "Time spent fitting, persisting and promoting a candidate model",
                RETRAIN_BUCKETS.to_vec()
            )
            .expect("Failed to register retrain_duration_seconds"),

            model_accuracy: register_gauge!(
                "readiness_model_accuracy",
                "Held-out accuracy of the active model"
            )
            .expect("Failed to register model_accuracy"),

            model_version_info: register_gauge_vec!(
                "readiness_model_version_info",
                "Information about the active model",
                &["version", "algorithm"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Retrain outcome label values
pub mod outcomes {
    pub const PROMOTED: &str = "promoted";
    pub const REJECTED: &str = "rejected";
    pub const FAILED: &str = "failed";
}

/// Lightweight handle to the global metrics instance.
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn observe_retrain(&self, outcome: &str, duration_secs: f64) {
        self.inner()
            .retrains_total
            .with_label_values(&[outcome])
            .inc();
        self.inner().retrain_duration_seconds.observe(duration_secs);
    }

    /// Publish the identity of the model now serving
    pub fn set_active_model(&self, version: &str, algorithm: &str, accuracy: Option<f64>) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version, algorithm])
            .set(1.0);
        // NaN marks an artifact that carries no accuracy
        self.inner().model_accuracy.set(accuracy.unwrap_or(f64::NAN));
    }
}

/// Structured logger for lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, service_version: &str, model_version: &str, model_path: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %service_version,
            model_version = %model_version,
            model_path = %model_path,
            "Readiness service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Readiness service shutting down"
        );
    }

    pub fn log_prediction(&self, probability: f64, label: &str, model_version: &str) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            probability = probability,
            label = %label,
            model_version = %model_version,
            "Prediction served"
        );
    }

    /// Logged once per retrain attempt, before any input is parsed.
    /// `rows` is only known when the caller already holds a dataset.
    pub fn log_retrain_started(&self, source: &str, rows: Option<usize>) {
        info!(
            event = "retrain_started",
            instance = %self.instance,
            source = %source,
            rows = rows,
            "Retraining candidate model"
        );
    }

    pub fn log_promotion(&self, old_version: &str, new_version: &str, accuracy: f64) {
        info!(
            event = "model_promoted",
            instance = %self.instance,
            old_version = %old_version,
            new_version = %new_version,
            accuracy = accuracy,
            "Candidate model persisted and promoted"
        );
    }

    pub fn log_retrain_failure(&self, active_version: &str, error: &str, client_error: bool) {
        warn!(
            event = "retrain_failed",
            instance = %self.instance,
            active_version = %active_version,
            client_error = client_error,
            error = %error,
            "Retrain failed, keeping active model"
        );
    }
}
