//! Prediction result types.
//!
//! Represents the classifier's output for one clinical record.

use serde::{Deserialize, Serialize};

/// Binary risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0: no cardiovascular disease predicted
    Low,
    /// Class 1: cardiovascular disease predicted
    High,
}

impl RiskLabel {
    /// Map a classifier class index to a label.
    #[must_use]
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Label plus optional positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: RiskLabel,

    /// Probability of the positive class (0.0 to 1.0); `None` when the
    /// classifier cannot estimate probabilities.
    pub probability: Option<f64>,
}

impl PredictionResult {
    #[must_use]
    pub fn new(label: RiskLabel, probability: Option<f64>) -> Self {
        Self { label, probability }
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.label == RiskLabel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_class() {
        assert_eq!(RiskLabel::from_class(0), Some(RiskLabel::Low));
        assert_eq!(RiskLabel::from_class(1), Some(RiskLabel::High));
        assert_eq!(RiskLabel::from_class(2), None);
        assert_eq!(RiskLabel::High.class(), 1);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(RiskLabel::High.description(), "High Risk");
        assert_eq!(RiskLabel::Low.description(), "Low Risk");
        assert_eq!(RiskLabel::High.to_string(), "HIGH");
    }

    #[test]
    fn test_prediction_without_probability() {
        let result = PredictionResult::new(RiskLabel::Low, None);
        assert!(!result.is_high_risk());
        assert!(result.probability.is_none());
    }
}
