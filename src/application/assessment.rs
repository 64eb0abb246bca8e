//! Assessment service: Orchestrates one risk assessment.
//!
//! This service coordinates:
//! - Feature encoding
//! - Classification (label, then optional probability)
//! - Advisory generation

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    ClinicalInput, Feature, FeatureEncoder, FeatureVector, PredictionResult, Recommendation,
    RecommendationEngine, RiskLabel,
};
use crate::ports::Classifier;
use crate::CardioError;

/// Output of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub prediction: PredictionResult,
    pub recommendations: Vec<Recommendation>,

    /// The vector the classifier saw
    pub features: FeatureVector,
}

/// Service running the encode → classify → advise pipeline.
///
/// The classifier is injected; the service itself holds no mutable state
/// and can be shared across request handlers behind an `Arc`.
pub struct AssessmentService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
    encoder: FeatureEncoder,
    engine: RecommendationEngine,
}

impl<C> AssessmentService<C>
where
    C: Classifier,
{
    /// Create a new assessment service.
    pub fn new(classifier: Arc<C>, encoder: FeatureEncoder, engine: RecommendationEngine) -> Self {
        Self {
            classifier,
            encoder,
            engine,
        }
    }

    #[must_use]
    pub fn classifier(&self) -> &Arc<C> {
        &self.classifier
    }

    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Run the full pipeline on one record.
    ///
    /// Input is validated before the classifier is touched. A missing or
    /// failing probability capability is not an error; the probability is
    /// simply absent.
    ///
    /// # Errors
    /// Returns `CardioError::InvalidInput` for out-of-domain fields,
    /// `CardioError::ModelUnavailable` if the model cannot be loaded, and
    /// `CardioError::Classifier` if the model misbehaves.
    pub fn assess(&self, input: &ClinicalInput) -> crate::Result<Assessment> {
        tracing::debug!("Step 1: Encoding clinical input...");
        let features = self.encoder.encode(input)?;

        tracing::debug!("Step 2: Classifying...");
        let class = self.classifier.predict(&features)?;
        let label = RiskLabel::from_class(class).ok_or_else(|| {
            CardioError::Classifier(format!("Classifier returned unknown class {class}"))
        })?;

        let probability = self.positive_probability(&features);
        let prediction = PredictionResult::new(label, probability);

        tracing::debug!("Step 3: Generating recommendations...");
        // Advise on the BMI the classifier saw, as resolved by the encoder.
        let advised = ClinicalInput {
            bmi: Some(features.get(Feature::Bmi)),
            ..input.clone()
        };
        let recommendations = self.engine.recommend(&advised, &prediction);

        tracing::info!(
            "Assessment complete: prediction={}, probability={}, recommendations={}",
            label.class(),
            probability.map_or_else(|| "n/a".to_string(), |p| format!("{:.2}%", p * 100.0)),
            recommendations.len()
        );

        Ok(Assessment {
            prediction,
            recommendations,
            features,
        })
    }

    fn positive_probability(&self, features: &FeatureVector) -> Option<f64> {
        let Some(estimator) = self.classifier.probability_estimator() else {
            tracing::debug!("Classifier has no probability capability");
            return None;
        };

        match estimator.predict_proba(features) {
            Ok([_, p]) if (0.0..=1.0).contains(&p) => Some(p),
            Ok([_, p]) => {
                tracing::warn!("Discarding out-of-range probability {p}");
                None
            }
            Err(e) => {
                tracing::debug!("Probability estimation failed: {e}");
                None
            }
        }
    }
}
