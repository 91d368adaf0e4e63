//! Inference against the active model
//!
//! Two presentation modes share one core:
//! - `probability`: raw probability and a label thresholded at 0.5
//! - `scored`: probability scaled to 0-100, thresholded at 70, plus
//!   rule-based explanations
//!
//! Explanations are derived from the input alone and never from the model
//! output, so they can disagree with the label.

use crate::error::Result;
use crate::registry::ModelRegistry;
use crate::schema::FeatureVector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const READY: &str = "Ready";
pub const NEEDS_IMPROVEMENT: &str = "Needs Improvement";

/// Probability at or above which a student is labeled ready
pub const PROBABILITY_THRESHOLD: f64 = 0.5;

/// Score (0-100) at or above which a student is labeled ready in scored mode
pub const SCORE_THRESHOLD: f64 = 70.0;

pub const NO_MAJOR_WEAKNESSES: &str = "No major weaknesses detected";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Probability,
    Scored,
}

/// Model output for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub probability: f64,
    pub label: &'static str,
    pub model_version: String,
}

/// Wire shape of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Scored {
        score: f64,
        status: String,
        explanations: Vec<String>,
    },
    Probability {
        probability: f64,
        label: String,
    },
}

pub fn readiness_label(probability: f64) -> &'static str {
    if probability >= PROBABILITY_THRESHOLD {
        READY
    } else {
        NEEDS_IMPROVEMENT
    }
}

pub fn score_status(score: f64) -> &'static str {
    if score >= SCORE_THRESHOLD {
        READY
    } else {
        NEEDS_IMPROVEMENT
    }
}

/// Rule-based notes on the input profile
pub fn explain(features: &FeatureVector) -> Vec<String> {
    let mut notes = Vec::new();
    if features.aptitude_score < 60.0 {
        notes.push("Aptitude score below 60 reduces readiness".to_string());
    }
    if features.dsa_rating < 3 {
        notes.push("DSA rating below 3 reduces readiness".to_string());
    }
    if features.cgpa < 6.5 {
        notes.push("CGPA below 6.5 reduces readiness".to_string());
    }
    if features.projects_count < 1 {
        notes.push("No completed projects reduces readiness".to_string());
    }
    if features.internship {
        notes.push("Internship experience improves readiness".to_string());
    }
    if features.attendance < 75.0 {
        notes.push("Attendance below 75% reduces readiness".to_string());
    }
    if notes.is_empty() {
        notes.push(NO_MAJOR_WEAKNESSES.to_string());
    }
    notes
}

pub struct InferenceEngine {
    registry: Arc<ModelRegistry>,
    mode: ResponseMode,
}

impl InferenceEngine {
    pub fn new(registry: Arc<ModelRegistry>, mode: ResponseMode) -> Self {
        Self { registry, mode }
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Query the active model
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let model = self.registry.get_active();
        let probability = model.predict_proba(features)?;
        Ok(Prediction {
            probability,
            label: readiness_label(probability),
            model_version: model.version().to_string(),
        })
    }

    /// Query the active model and shape the answer for the configured mode
    pub fn respond(&self, features: &FeatureVector) -> Result<(Prediction, PredictionResponse)> {
        let prediction = self.predict(features)?;
        let response = match self.mode {
            ResponseMode::Probability => PredictionResponse::Probability {
                probability: prediction.probability,
                label: prediction.label.to_string(),
            },
            ResponseMode::Scored => {
                let score = prediction.probability * 100.0;
                PredictionResponse::Scored {
                    score,
                    status: score_status(score).to_string(),
                    explanations: explain(features),
                }
            }
        };
        Ok((prediction, response))
    }
}
