//! Domain layer: Core assessment types and logic.
//!
//! Pure Rust with no I/O. Everything here is deterministic and safe to call
//! concurrently from any number of request handlers.

mod clinical;
mod features;
mod prediction;
mod recommendation;

pub use clinical::{defaults, ClinicalInput, Gender, InputError, Level, RawClinicalInput};
pub use features::{
    compute_bmi, is_hypertensive, AgeGrouping, DerivedFieldPolicy, DerivedFields, Feature,
    FeatureEncoder, FeatureVector, FEATURE_COUNT, FEATURE_NAMES,
};
pub use prediction::{PredictionResult, RiskLabel};
pub use recommendation::{
    Advisory, AdvisoryTone, Recommendation, RecommendationEngine, RuleSet,
};
