//! Feature encoding for the cardiovascular risk classifier.
//!
//! The classifier consumes a 15-element vector whose column order is fixed
//! by training. Reordering columns does not fail loudly; it silently produces
//! wrong predictions, so the order lives in exactly one place: [`Feature`].

use serde::{Deserialize, Serialize};

use super::clinical::{defaults, ClinicalInput, InputError};

/// Number of columns in the training schema.
pub const FEATURE_COUNT: usize = 15;

/// Column names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "ageInYr",
    "bmi",
    "hypertension",
    "obese",
    "age_group",
];

/// Systolic pressure at or above which a reading counts as hypertensive.
pub const HYPERTENSION_SYSTOLIC: u32 = 140;
/// Diastolic pressure at or above which a reading counts as hypertensive.
pub const HYPERTENSION_DIASTOLIC: u32 = 90;
/// BMI at or above which a patient counts as obese.
pub const OBESITY_BMI: f64 = 30.0;

/// A column of the training schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Gender,
    Height,
    Weight,
    SystolicBp,
    DiastolicBp,
    Cholesterol,
    Glucose,
    Smoke,
    Alcohol,
    Active,
    AgeYears,
    Bmi,
    Hypertension,
    Obese,
    AgeGroup,
}

impl Feature {
    /// All columns in training order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Self::Gender,
        Self::Height,
        Self::Weight,
        Self::SystolicBp,
        Self::DiastolicBp,
        Self::Cholesterol,
        Self::Glucose,
        Self::Smoke,
        Self::Alcohol,
        Self::Active,
        Self::AgeYears,
        Self::Bmi,
        Self::Hypertension,
        Self::Obese,
        Self::AgeGroup,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }
}

/// Encoded model input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

/// Age binning scheme. Must match the scheme the deployed model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGrouping {
    /// `<30, [30,45), [45,60), >=60` → 0..=3
    #[default]
    FourBucket,
    /// As four-bucket, with `>=60` split into `[60,75)` → 3 and `>=75` → 4
    FiveBucket,
}

impl AgeGrouping {
    #[must_use]
    pub fn group_for(self, age_years: u32) -> u8 {
        match age_years {
            0..=29 => 0,
            30..=44 => 1,
            45..=59 => 2,
            60..=74 => 3,
            _ => match self {
                Self::FourBucket => 3,
                Self::FiveBucket => 4,
            },
        }
    }
}

/// How absent derived fields are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedFieldPolicy {
    /// Compute from the base measurements.
    #[default]
    Derive,
    /// Use fixed neutral values (bmi 25.0, no hypertension, not obese, group 2).
    Neutral,
}

/// Derived columns after resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFields {
    pub bmi: f64,
    pub has_hypertension: bool,
    pub is_obese: bool,
    pub age_group: u8,
}

/// Body mass index rounded to two decimals.
#[must_use]
pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round2(weight_kg / height_m.powi(2))
}

#[must_use]
pub fn is_hypertensive(systolic_bp: u32, diastolic_bp: u32) -> bool {
    systolic_bp >= HYPERTENSION_SYSTOLIC || diastolic_bp >= HYPERTENSION_DIASTOLIC
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Maps a [`ClinicalInput`] to the classifier's feature vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder {
    grouping: AgeGrouping,
    policy: DerivedFieldPolicy,
}

impl FeatureEncoder {
    #[must_use]
    pub fn new(grouping: AgeGrouping, policy: DerivedFieldPolicy) -> Self {
        Self { grouping, policy }
    }

    #[must_use]
    pub fn grouping(&self) -> AgeGrouping {
        self.grouping
    }

    #[must_use]
    pub fn policy(&self) -> DerivedFieldPolicy {
        self.policy
    }

    /// Fill in derived fields the caller did not supply.
    ///
    /// Supplied values always win over derivation.
    #[must_use]
    pub fn resolve(&self, input: &ClinicalInput) -> DerivedFields {
        match self.policy {
            DerivedFieldPolicy::Derive => {
                let bmi = input
                    .bmi
                    .unwrap_or_else(|| compute_bmi(input.height_cm, input.weight_kg));
                DerivedFields {
                    bmi,
                    has_hypertension: input
                        .has_hypertension
                        .unwrap_or_else(|| is_hypertensive(input.systolic_bp, input.diastolic_bp)),
                    is_obese: input.is_obese.unwrap_or(bmi >= OBESITY_BMI),
                    age_group: input
                        .age_group
                        .unwrap_or_else(|| self.grouping.group_for(input.age_years)),
                }
            }
            DerivedFieldPolicy::Neutral => DerivedFields {
                bmi: input.bmi.unwrap_or(defaults::BMI),
                has_hypertension: input.has_hypertension.unwrap_or(false),
                is_obese: input.is_obese.unwrap_or(false),
                age_group: input.age_group.unwrap_or(defaults::AGE_GROUP),
            },
        }
    }

    /// Encode a clinical record.
    ///
    /// A supplied age group anywhere in the wire domain is passed through;
    /// the configured scheme only governs derivation.
    ///
    /// # Errors
    /// Returns [`InputError`] if any field is outside its domain, or if the
    /// measurements yield a non-finite BMI.
    pub fn encode(&self, input: &ClinicalInput) -> Result<FeatureVector, InputError> {
        input.validate().map_err(InputError::new)?;

        let derived = self.resolve(input);
        if !derived.bmi.is_finite() {
            return Err(InputError::new(vec![format!(
                "BMI derived from height {} and weight {} is not finite",
                input.height_cm, input.weight_kg
            )]));
        }

        let mut values = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            values[feature.index()] = match feature {
                Feature::Gender => f64::from(input.gender.code()),
                Feature::Height => input.height_cm,
                Feature::Weight => input.weight_kg,
                Feature::SystolicBp => f64::from(input.systolic_bp),
                Feature::DiastolicBp => f64::from(input.diastolic_bp),
                Feature::Cholesterol => f64::from(input.cholesterol.code()),
                Feature::Glucose => f64::from(input.glucose.code()),
                Feature::Smoke => flag(input.smokes),
                Feature::Alcohol => flag(input.drinks_alcohol),
                Feature::Active => flag(input.physically_active),
                Feature::AgeYears => f64::from(input.age_years),
                Feature::Bmi => derived.bmi,
                Feature::Hypertension => flag(derived.has_hypertension),
                Feature::Obese => flag(derived.is_obese),
                Feature::AgeGroup => f64::from(derived.age_group),
            };
        }

        Ok(FeatureVector(values))
    }
}
