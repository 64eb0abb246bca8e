//! Classifier port: Capability traits for the risk model.
//!
//! Every model can label a feature vector. Estimating probabilities is a
//! separate, optional capability that callers query per request instead of
//! assuming it exists.

use crate::domain::FeatureVector;

/// Errors raised by a classifier collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Base capability: binary class prediction.
pub trait Labeler: Send + Sync {
    /// Predict the class (0 or 1) for one feature vector.
    ///
    /// # Errors
    /// Returns `ClassifierError::Unavailable` if the model is not loaded,
    /// `ClassifierError::Inference` if evaluation fails.
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError>;
}

/// Optional capability: class probabilities.
pub trait ProbabilityEstimator: Send + Sync {
    /// Return `[p(class 0), p(class 1)]`.
    ///
    /// # Errors
    /// Returns error if evaluation fails.
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError>;
}

/// A labeler that may also estimate probabilities.
pub trait Classifier: Labeler {
    /// The probability capability, if this model has one.
    fn probability_estimator(&self) -> Option<&dyn ProbabilityEstimator> {
        None
    }
}
