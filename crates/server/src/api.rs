//! HTTP API: prediction, retraining, model metadata, health and metrics

use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart,
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use readiness_lib::{health::ComponentStatus, ModelMetadata, PredictionResponse, ReadinessService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Multipart field carrying the training CSV
pub const UPLOAD_FIELD: &str = "file";

/// Shared application state
pub struct AppState {
    pub service: ReadinessService,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: ReadinessService, max_upload_bytes: usize) -> Self {
        Self {
            service,
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrainResponse {
    pub message: String,
    pub accuracy: f64,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Unprocessable(format!("Invalid JSON body: {}", e)))?;
    let record = value
        .as_object()
        .ok_or_else(|| ApiError::Unprocessable("Request body must be a JSON object".to_string()))?;

    state
        .service
        .predict(record)
        .map(Json)
        .map_err(ApiError::prediction)
}

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

async fn retrain(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RetrainResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.ends_with(".csv") {
            return Err(ApiError::BadRequest("Only CSV files are allowed".to_string()));
        }
        // Fully buffered before parsing
        let data = field.bytes().await.map_err(upload_error)?;
        info!(file_name = %file_name, bytes = data.len(), "Received training upload");
        upload = Some(data);
        break;
    }

    let data = upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let report = state
        .service
        .retrain_csv(data.to_vec())
        .await
        .map_err(ApiError::retrain)?;

    Ok(Json(RetrainResponse {
        message: report.message,
        accuracy: report.accuracy,
    }))
}

async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelMetadata> {
    Json(state.service.model_info())
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.service.health().health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.service.health().readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.max_upload_bytes;

    Router::new()
        .route("/predict", post(predict))
        .route(
            "/retrain",
            post(retrain).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/model", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, draining in-flight requests once `shutdown` resolves
pub async fn serve<F>(port: u16, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
