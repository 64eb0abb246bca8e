//! # cardiorisk
//!
//! Cardiovascular risk assessment from routine clinical measurements.
//!
//! This crate provides:
//! - Deterministic encoding of clinical inputs into the classifier's
//!   15-column feature vector
//! - A rule engine producing ordered, categorized health advisories
//! - A logistic regression adapter and a JSON-over-HTTP boundary
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ClinicalInput, FeatureEncoder, RecommendationEngine)
//! - `ports`: Classifier capability traits
//! - `adapters`: Concrete implementations (logistic model, HTTP, log sanitizing)
//! - `application`: The assessment use case
//! - `config`: Process settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{Assessment, AssessmentService};
pub use domain::{ClinicalInput, PredictionResult, Recommendation, RiskLabel};

/// Result type for cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Broad error classes, used to pick a user-facing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ModelUnavailable,
    Classifier,
}

/// Main error type for cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error(transparent)]
    InvalidInput(#[from] domain::InputError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Classifier failure: {0}")]
    Classifier(String),
}

impl CardioError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::Classifier(_) => ErrorKind::Classifier,
        }
    }
}

impl From<ports::ClassifierError> for CardioError {
    fn from(e: ports::ClassifierError) -> Self {
        match e {
            ports::ClassifierError::Unavailable(msg) => Self::ModelUnavailable(msg),
            ports::ClassifierError::Inference(msg) => Self::Classifier(msg),
        }
    }
}
