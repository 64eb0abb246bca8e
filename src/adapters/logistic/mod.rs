//! Logistic regression adapter: Implementation of the classifier ports.
//!
//! Loads a standardized logistic regression exported from the training
//! pipeline as JSON and evaluates it in plain `f64` arithmetic.
//!
//! # Artifact format
//!
//! ```json
//! {
//!   "feature_names": ["gender", "height", ...],
//!   "coefficients": [...],
//!   "intercept": -0.03,
//!   "scaler_mean": [...],
//!   "scaler_scale": [...],
//!   "threshold": 0.5,
//!   "supports_probability": true
//! }
//! ```
//!
//! # Integrity
//!
//! A `manifest.json` next to the artifact may bind file names to SHA-256
//! digests. When present it must bind the artifact being loaded and the
//! digest must match; with [`Integrity::Required`] it must exist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{Classifier, ClassifierError, Labeler, ProbabilityEstimator};

const MANIFEST_FILE: &str = "manifest.json";

/// Errors loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact: {0}")]
    Format(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),
}

/// Whether a digest manifest must accompany the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integrity {
    #[default]
    Optional,
    Required,
}

fn default_threshold() -> f64 {
    0.5
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub supports_probability: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct ModelManifest {
    version: u32,
    files: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn read(path: &Path) -> Result<Vec<u8>, ModelError> {
    std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Standardized logistic regression over the 15-column training schema.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    params: ExportedLogisticModel,
}

impl LogisticModel {
    /// Build a model from exported parameters.
    ///
    /// # Errors
    /// Returns `ModelError::Format` if the parameters do not describe the
    /// training schema exactly.
    pub fn from_params(params: ExportedLogisticModel) -> Result<Self, ModelError> {
        let names: Vec<&str> = params.feature_names.iter().map(String::as_str).collect();
        if names != FEATURE_NAMES {
            return Err(ModelError::Format(format!(
                "feature_names {names:?} do not match the expected schema {FEATURE_NAMES:?}"
            )));
        }
        if params.coefficients.len() != FEATURE_COUNT
            || params.scaler_mean.len() != FEATURE_COUNT
            || params.scaler_scale.len() != FEATURE_COUNT
        {
            return Err(ModelError::Format(
                "Model parameter lengths do not match feature_names length".into(),
            ));
        }
        if let Some(i) = params
            .scaler_scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ModelError::Format(format!(
                "scaler_scale for {} must be finite and non-zero",
                FEATURE_NAMES[i]
            )));
        }
        let all_finite = params
            .coefficients
            .iter()
            .chain(&params.scaler_mean)
            .chain(std::iter::once(&params.intercept))
            .all(|x| x.is_finite());
        if !all_finite {
            return Err(ModelError::Format("Model parameters must be finite".into()));
        }
        if !(params.threshold > 0.0 && params.threshold < 1.0) {
            return Err(ModelError::Format(format!(
                "threshold {} must lie in (0, 1)",
                params.threshold
            )));
        }

        Ok(Self { params })
    }

    /// Load and validate an artifact from disk.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, fails the integrity check,
    /// or does not describe the training schema.
    pub fn load(path: &Path, integrity: Integrity) -> Result<Self, ModelError> {
        let bytes = read(path)?;
        Self::verify_manifest(path, &bytes, integrity)?;

        let params: ExportedLogisticModel = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Format(e.to_string()))?;
        let model = Self::from_params(params)?;

        tracing::info!(
            "Loaded model from {:?} (n_features={}, threshold={}, probability={})",
            path,
            FEATURE_COUNT,
            model.params.threshold,
            model.params.supports_probability
        );
        Ok(model)
    }

    fn verify_manifest(path: &Path, bytes: &[u8], integrity: Integrity) -> Result<(), ModelError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let manifest_path = dir.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            return match integrity {
                Integrity::Required => Err(ModelError::Integrity(format!(
                    "{MANIFEST_FILE} required next to {path:?}"
                ))),
                Integrity::Optional => {
                    tracing::warn!("No {MANIFEST_FILE} next to {:?}; loading unverified model", path);
                    Ok(())
                }
            };
        }

        let manifest: ModelManifest = serde_json::from_slice(&read(&manifest_path)?)
            .map_err(|e| ModelError::Integrity(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
        if manifest.version != 1 {
            return Err(ModelError::Integrity(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ModelError::Integrity(format!("Unusable model path {path:?}")))?;
        let expected = manifest.files.get(file_name).ok_or_else(|| {
            ModelError::Integrity(format!("{MANIFEST_FILE} does not bind {file_name}"))
        })?;

        let actual = sha256_hex(bytes);
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ModelError::Integrity(format!(
                "SHA-256 mismatch for {file_name}"
            )));
        }

        tracing::info!("Model digest verified against {MANIFEST_FILE}");
        Ok(())
    }

    #[must_use]
    pub fn supports_probability(&self) -> bool {
        self.params.supports_probability
    }

    /// Linear score on standardized features.
    fn decision_function(&self, features: &FeatureVector) -> f64 {
        let p = &self.params;
        features
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, x)| p.coefficients[i] * (x - p.scaler_mean[i]) / p.scaler_scale[i])
            .sum::<f64>()
            + p.intercept
    }

    /// Positive-class probability.
    #[must_use]
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.decision_function(features))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Labeler for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        let p = self.probability(features);
        if !p.is_finite() {
            return Err(ClassifierError::Inference(
                "Non-finite decision score".into(),
            ));
        }
        Ok(u8::from(p >= self.params.threshold))
    }
}

impl ProbabilityEstimator for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError> {
        let p = self.probability(features);
        if !p.is_finite() {
            return Err(ClassifierError::Inference(
                "Non-finite decision score".into(),
            ));
        }
        Ok([1.0 - p, p])
    }
}

impl Classifier for LogisticModel {
    fn probability_estimator(&self) -> Option<&dyn ProbabilityEstimator> {
        if self.params.supports_probability {
            Some(self)
        } else {
            None
        }
    }
}
