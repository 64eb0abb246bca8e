//! Clinical input types for cardiovascular risk prediction.
//!
//! Field semantics follow the cardiovascular disease dataset the deployed
//! classifier was trained on: `ap_hi`/`ap_lo` blood pressure readings, ordinal
//! cholesterol and glucose levels, and self-reported lifestyle flags.

use serde::{Deserialize, Serialize};

/// Neutral values used when a field is absent from a request.
pub mod defaults {
    pub const HEIGHT_CM: f64 = 165.0;
    pub const WEIGHT_KG: f64 = 70.0;
    pub const SYSTOLIC_BP: u32 = 120;
    pub const DIASTOLIC_BP: u32 = 80;
    pub const AGE_YEARS: u32 = 45;
    pub const BMI: f64 = 25.0;
    pub const AGE_GROUP: u8 = 2;
}

/// Widest age-group code accepted on the wire (5-bucket scheme).
const MAX_AGE_GROUP: u8 = 4;

/// Biological sex as encoded in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Female,
    Male,
}

impl Gender {
    /// Wire code: female = 0, male = 1.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Female),
            1 => Some(Self::Male),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }
}

/// Ordinal lab result level (cholesterol, glucose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Level {
    #[default]
    Normal,
    AboveNormal,
    WellAboveNormal,
}

impl Level {
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::AboveNormal),
            3 => Some(Self::WellAboveNormal),
            _ => None,
        }
    }

    /// Wire code: normal = 1, above normal = 2, well above normal = 3.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::AboveNormal => 2,
            Self::WellAboveNormal => 3,
        }
    }

    /// Anything above normal.
    #[must_use]
    pub fn is_elevated(self) -> bool {
        self >= Self::AboveNormal
    }
}

/// A validated clinical record for one assessment.
///
/// Derived fields (`bmi`, `has_hypertension`, `is_obese`, `age_group`) are
/// `None` when the caller did not supply them; the feature encoder fills
/// them in according to its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    pub gender: Gender,

    /// Height in centimetres
    pub height_cm: f64,

    /// Weight in kilograms
    pub weight_kg: f64,

    /// Systolic blood pressure in mmHg (ap_hi)
    pub systolic_bp: u32,

    /// Diastolic blood pressure in mmHg (ap_lo)
    pub diastolic_bp: u32,

    pub cholesterol: Level,
    pub glucose: Level,

    pub smokes: bool,
    pub drinks_alcohol: bool,
    pub physically_active: bool,

    pub age_years: u32,

    pub bmi: Option<f64>,
    pub has_hypertension: Option<bool>,
    pub is_obese: Option<bool>,
    pub age_group: Option<u8>,
}

impl Default for ClinicalInput {
    fn default() -> Self {
        Self {
            gender: Gender::Female,
            height_cm: defaults::HEIGHT_CM,
            weight_kg: defaults::WEIGHT_KG,
            systolic_bp: defaults::SYSTOLIC_BP,
            diastolic_bp: defaults::DIASTOLIC_BP,
            cholesterol: Level::Normal,
            glucose: Level::Normal,
            smokes: false,
            drinks_alcohol: false,
            physically_active: true,
            age_years: defaults::AGE_YEARS,
            bmi: None,
            has_hypertension: None,
            is_obese: None,
            age_group: None,
        }
    }
}

impl ClinicalInput {
    /// Check that every field lies in its declared domain.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.height_cm.is_finite() && self.height_cm > 0.0) {
            errors.push(format!("Height {} must be a positive number", self.height_cm));
        }
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            errors.push(format!("Weight {} must be a positive number", self.weight_kg));
        }
        if self.systolic_bp == 0 {
            errors.push("Systolic BP must be positive".to_string());
        }
        if self.diastolic_bp == 0 {
            errors.push("Diastolic BP must be positive".to_string());
        }
        if self.age_years == 0 {
            errors.push("Age must be positive".to_string());
        }
        if let Some(bmi) = self.bmi {
            if !(bmi.is_finite() && bmi > 0.0) {
                errors.push(format!("BMI {bmi} must be a positive number"));
            }
        }
        if let Some(group) = self.age_group {
            if group > MAX_AGE_GROUP {
                errors.push(format!("Age group {group} out of range [0, {MAX_AGE_GROUP}]"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Domain violation in a supplied clinical field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid clinical input: {}", .violations.join("; "))]
pub struct InputError {
    pub violations: Vec<String>,
}

impl InputError {
    #[must_use]
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }
}

impl From<Vec<String>> for InputError {
    fn from(violations: Vec<String>) -> Self {
        Self::new(violations)
    }
}

/// Clinical record as it arrives on the wire.
///
/// Every field is optional and numeric, keyed by the training-schema column
/// names. Conversion applies the neutral defaults and rejects values outside
/// their domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClinicalInput {
    #[serde(default)]
    pub gender: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub ap_hi: Option<f64>,
    #[serde(default)]
    pub ap_lo: Option<f64>,
    #[serde(default)]
    pub cholesterol: Option<f64>,
    #[serde(default)]
    pub gluc: Option<f64>,
    #[serde(default)]
    pub smoke: Option<f64>,
    #[serde(default)]
    pub alco: Option<f64>,
    #[serde(default)]
    pub active: Option<f64>,
    #[serde(default, rename = "ageInYr")]
    pub age_in_yr: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub hypertension: Option<f64>,
    #[serde(default)]
    pub obese: Option<f64>,
    #[serde(default)]
    pub age_group: Option<f64>,
}

/// Accumulates per-field violations while converting a raw record.
struct FieldReader {
    errors: Vec<String>,
}

impl FieldReader {
    fn whole(&mut self, name: &str, value: f64, min: f64, max: f64) -> Option<u32> {
        if !value.is_finite() || value.fract() != 0.0 {
            self.errors.push(format!("{name} {value} must be a whole number"));
            return None;
        }
        if value < min || value > max {
            self.errors
                .push(format!("{name} {value} out of range [{min}, {max}]"));
            return None;
        }
        Some(value as u32)
    }

    fn positive_real(&mut self, name: &str, value: Option<f64>, default: f64) -> f64 {
        match value {
            None => default,
            Some(v) if v.is_finite() && v > 0.0 => v,
            Some(v) => {
                self.errors.push(format!("{name} {v} must be a positive number"));
                default
            }
        }
    }

    fn positive_whole(&mut self, name: &str, value: Option<f64>, default: u32) -> u32 {
        value
            .map(|v| self.whole(name, v, 1.0, f64::from(u32::MAX)).unwrap_or(default))
            .unwrap_or(default)
    }

    fn flag(&mut self, name: &str, value: Option<f64>) -> Option<bool> {
        let v = value?;
        if v == 0.0 {
            Some(false)
        } else if v == 1.0 {
            Some(true)
        } else {
            self.errors.push(format!("{name} {v} must be 0 or 1"));
            None
        }
    }

    fn level(&mut self, name: &str, value: Option<f64>) -> Level {
        value
            .and_then(|v| self.whole(name, v, 1.0, 3.0))
            .and_then(|code| Level::from_code(code as u8))
            .unwrap_or_default()
    }
}

impl RawClinicalInput {
    /// True when no field was supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply defaults and validate into a [`ClinicalInput`].
    ///
    /// # Errors
    /// Returns every field that is outside its declared domain.
    pub fn into_clinical_input(self) -> Result<ClinicalInput, InputError> {
        let mut r = FieldReader { errors: Vec::new() };

        let gender = match r.flag("gender", self.gender) {
            Some(true) => Gender::Male,
            _ => Gender::Female,
        };

        let input = ClinicalInput {
            gender,
            height_cm: r.positive_real("height", self.height, defaults::HEIGHT_CM),
            weight_kg: r.positive_real("weight", self.weight, defaults::WEIGHT_KG),
            systolic_bp: r.positive_whole("ap_hi", self.ap_hi, defaults::SYSTOLIC_BP),
            diastolic_bp: r.positive_whole("ap_lo", self.ap_lo, defaults::DIASTOLIC_BP),
            cholesterol: r.level("cholesterol", self.cholesterol),
            glucose: r.level("gluc", self.gluc),
            smokes: r.flag("smoke", self.smoke).unwrap_or(false),
            drinks_alcohol: r.flag("alco", self.alco).unwrap_or(false),
            physically_active: r.flag("active", self.active).unwrap_or(true),
            age_years: r.positive_whole("ageInYr", self.age_in_yr, defaults::AGE_YEARS),
            bmi: self
                .bmi
                .map(|v| r.positive_real("bmi", Some(v), defaults::BMI)),
            has_hypertension: r.flag("hypertension", self.hypertension),
            is_obese: r.flag("obese", self.obese),
            age_group: self
                .age_group
                .and_then(|v| r.whole("age_group", v, 0.0, f64::from(MAX_AGE_GROUP)))
                .map(|g| g as u8),
        };

        if r.errors.is_empty() {
            Ok(input)
        } else {
            Err(InputError::new(r.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_raw_input_uses_neutral_defaults() {
        let raw = RawClinicalInput::default();
        assert!(raw.is_empty());

        let input = raw.into_clinical_input().expect("Defaults are valid");
        assert_eq!(input, ClinicalInput::default());
        assert!(input.physically_active);
        assert_eq!(input.cholesterol, Level::Normal);
    }

    #[test]
    fn test_wire_names_deserialize() {
        let json = r#"{"gender": 1, "height": 180, "weight": 90.5, "ap_hi": 150,
            "ap_lo": 95, "cholesterol": 2, "gluc": 1, "smoke": 1, "alco": 0,
            "active": 0, "ageInYr": 55, "bmi": 27.8, "hypertension": 1,
            "obese": 0, "age_group": 2}"#;
        let raw: RawClinicalInput = serde_json::from_str(json).expect("Should parse");
        let input = raw.into_clinical_input().expect("Should validate");

        assert_eq!(input.gender, Gender::Male);
        assert!((input.weight_kg - 90.5).abs() < f64::EPSILON);
        assert_eq!(input.systolic_bp, 150);
        assert_eq!(input.cholesterol, Level::AboveNormal);
        assert!(input.smokes);
        assert!(!input.physically_active);
        assert_eq!(input.age_years, 55);
        assert_eq!(input.bmi, Some(27.8));
        assert_eq!(input.has_hypertension, Some(true));
        assert_eq!(input.is_obese, Some(false));
        assert_eq!(input.age_group, Some(2));
    }

    #[test]
    fn test_out_of_domain_values_are_all_reported() {
        let raw = RawClinicalInput {
            height: Some(-170.0),
            cholesterol: Some(4.0),
            smoke: Some(2.0),
            ap_hi: Some(120.5),
            ..Default::default()
        };
        let err = raw.into_clinical_input().expect_err("Must reject");
        assert_eq!(err.violations.len(), 4);
        assert!(err.to_string().contains("height"));
        assert!(err.to_string().contains("cholesterol"));
    }

    #[test]
    fn test_validate_catches_direct_construction() {
        let invalid = ClinicalInput {
            weight_kg: 0.0,
            systolic_bp: 0,
            bmi: Some(f64::NAN),
            ..Default::default()
        };
        let errors = invalid.validate().expect_err("Must be invalid");
        assert_eq!(errors.len(), 3);

        let group = ClinicalInput {
            age_group: Some(5),
            ..Default::default()
        };
        assert_eq!(group.validate().expect_err("Must be invalid").len(), 1);

        assert!(ClinicalInput::default().validate().is_ok());
    }

    #[test]
    fn test_level_ordering() {
        assert!(!Level::Normal.is_elevated());
        assert!(Level::AboveNormal.is_elevated());
        assert!(Level::WellAboveNormal.is_elevated());
        assert_eq!(Level::from_code(3).map(Level::code), Some(3));
        assert!(Level::from_code(0).is_none());
    }
}
