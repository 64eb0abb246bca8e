//! HTTP DTOs for the assessment endpoints.
//!
//! These types fix the JSON contract independently of the domain types.

use serde::{Deserialize, Serialize};

use crate::application::Assessment;
use crate::domain::Recommendation;

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One advisory as rendered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub category: String,
    pub icon: String,
    pub text: String,
}

impl From<&Recommendation> for RecommendationResponse {
    fn from(r: &Recommendation) -> Self {
        Self {
            category: r.category.to_string(),
            icon: r.icon.to_string(),
            text: r.text.to_string(),
        }
    }
}

/// Body of a successful `POST /api/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// 1 = cardiovascular disease predicted
    pub prediction: u8,

    /// Positive-class probability, `null` when the model has no estimate
    pub probability: Option<f64>,

    /// "High Risk" or "Low Risk"
    pub risk_level: String,

    pub recommendations: Vec<RecommendationResponse>,
}

impl From<&Assessment> for PredictResponse {
    fn from(a: &Assessment) -> Self {
        Self {
            prediction: a.prediction.label.class(),
            probability: a.prediction.probability,
            risk_level: a.prediction.label.description().to_string(),
            recommendations: a.recommendations.iter().map(Into::into).collect(),
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: String,
}

/// Error body for every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
