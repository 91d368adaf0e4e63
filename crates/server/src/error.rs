//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use readiness_lib::ReadinessError;
use serde_json::json;
use thiserror::Error;

pub const PREDICTION_FAILED: &str = "Prediction failed";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a failure from the prediction path
    pub fn prediction(err: ReadinessError) -> Self {
        if err.is_client_error() {
            ApiError::Unprocessable(err.to_string())
        } else {
            tracing::error!(error = %err, "Prediction failed");
            ApiError::Internal(PREDICTION_FAILED.to_string())
        }
    }

    /// Map a failure from the retrain path
    pub fn retrain(err: ReadinessError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            tracing::error!(error = %err, "Retraining failed");
            ApiError::Internal(format!("Retraining failed: {}", err))
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
