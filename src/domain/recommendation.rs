//! Rule engine turning a clinical record and a prediction into advisories.

use serde::{Deserialize, Serialize};

use super::clinical::ClinicalInput;
use super::features::{compute_bmi, is_hypertensive, OBESITY_BMI};
use super::prediction::PredictionResult;

/// BMI at or above which a patient counts as overweight.
pub const OVERWEIGHT_BMI: f64 = 25.0;
/// Age from which routine cardiovascular screening is advised.
pub const CHECKUP_AGE: u32 = 50;

/// A specific advisory the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Advisory {
    ConsultDoctor,
    ElevatedBloodPressure,
    Obesity,
    Overweight,
    ElevatedCholesterol,
    ElevatedGlucose,
    Smoking,
    Alcohol,
    Inactivity,
    RegularCheckups,
    MaintainHealth,
}

/// Wording variant for advisory text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryTone {
    #[default]
    Detailed,
    Brief,
}

impl Advisory {
    #[must_use]
    pub fn category(self) -> &'static str {
        match self {
            Self::ConsultDoctor => "Consult Doctor",
            Self::ElevatedBloodPressure => "Blood Pressure",
            Self::Obesity | Self::Overweight => "Weight Management",
            Self::ElevatedCholesterol => "Cholesterol",
            Self::ElevatedGlucose => "Blood Sugar",
            Self::Smoking => "Smoking",
            Self::Alcohol => "Alcohol",
            Self::Inactivity => "Physical Activity",
            Self::RegularCheckups => "Regular Checkups",
            Self::MaintainHealth => "Maintain Health",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::ConsultDoctor => "👨‍⚕️",
            Self::ElevatedBloodPressure => "🩺",
            Self::Obesity | Self::Overweight => "⚖️",
            Self::ElevatedCholesterol => "🫀",
            Self::ElevatedGlucose => "🍬",
            Self::Smoking => "🚭",
            Self::Alcohol => "🍷",
            Self::Inactivity => "🏃",
            Self::RegularCheckups => "📋",
            Self::MaintainHealth => "✅",
        }
    }

    #[must_use]
    pub fn text(self, tone: AdvisoryTone) -> &'static str {
        match tone {
            AdvisoryTone::Detailed => match self {
                Self::ConsultDoctor => "Based on your risk factors, we recommend scheduling a consultation with a cardiologist.",
                Self::ElevatedBloodPressure => "Your blood pressure is elevated. Consider monitoring it regularly and consulting a healthcare provider.",
                Self::Obesity => "Your BMI indicates obesity. A balanced diet and regular exercise can help manage weight.",
                Self::Overweight => "Your BMI indicates you're overweight. Consider lifestyle modifications for better health.",
                Self::ElevatedCholesterol => "Elevated cholesterol levels detected. Consider a heart-healthy diet low in saturated fats.",
                Self::ElevatedGlucose => "Elevated glucose levels detected. Monitor your sugar intake and consider regular testing.",
                Self::Smoking => "Smoking significantly increases cardiovascular risk. Consider smoking cessation programs.",
                Self::Alcohol => "Excessive alcohol consumption can affect heart health. Moderation is key.",
                Self::Inactivity => "Physical inactivity is a risk factor. Aim for at least 150 minutes of moderate exercise weekly.",
                Self::RegularCheckups => "Regular cardiovascular screenings are recommended for adults over 50.",
                Self::MaintainHealth => "Your risk appears low. Continue maintaining a healthy lifestyle!",
            },
            AdvisoryTone::Brief => match self {
                Self::ConsultDoctor => "We recommend scheduling a consultation with a cardiologist.",
                Self::ElevatedBloodPressure => "Your blood pressure is elevated. Consider monitoring it regularly.",
                Self::Obesity => "Your BMI indicates obesity. Balanced diet and exercise are advised.",
                Self::Overweight => "Your BMI indicates overweight. Lifestyle modifications recommended.",
                Self::ElevatedCholesterol => "Elevated cholesterol levels. Heart-healthy diet recommended.",
                Self::ElevatedGlucose => "Elevated glucose levels. Monitor sugar intake.",
                Self::Smoking => "Smoking increases risk. Consider cessation programs.",
                Self::Alcohol => "Moderate alcohol consumption for better heart health.",
                Self::Inactivity => "Aim for at least 150 minutes of moderate exercise weekly.",
                Self::RegularCheckups => "Regular heart screenings are advised after 50.",
                Self::MaintainHealth => "Your risk appears low. Keep it up!",
            },
        }
    }
}

/// One rendered advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub category: &'static str,
    pub icon: &'static str,
    pub text: &'static str,

    #[serde(skip)]
    pub advisory: Advisory,
}

impl Recommendation {
    #[must_use]
    pub fn new(advisory: Advisory, tone: AdvisoryTone) -> Self {
        Self {
            category: advisory.category(),
            icon: advisory.icon(),
            text: advisory.text(tone),
            advisory,
        }
    }
}

/// Optional rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Emit "Regular Checkups" for patients aged 50 and over.
    pub regular_checkups: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            regular_checkups: true,
        }
    }
}

/// Stateless advisory generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine {
    rules: RuleSet,
    tone: AdvisoryTone,
}

impl RecommendationEngine {
    #[must_use]
    pub fn new(rules: RuleSet, tone: AdvisoryTone) -> Self {
        Self { rules, tone }
    }

    #[must_use]
    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Evaluate every rule against the input and order the result.
    ///
    /// "Consult Doctor" is placed first for high-risk predictions; otherwise
    /// "Maintain Health" is placed last. Never fails: a field that cannot be
    /// evaluated simply does not trigger its rule.
    #[must_use]
    pub fn recommend(
        &self,
        input: &ClinicalInput,
        prediction: &PredictionResult,
    ) -> Vec<Recommendation> {
        let mut advisories = Vec::new();

        if is_hypertensive(input.systolic_bp, input.diastolic_bp) {
            advisories.push(Advisory::ElevatedBloodPressure);
        }

        if let Some(tier) = bmi_of(input).and_then(weight_tier) {
            advisories.push(tier);
        }

        if input.cholesterol.is_elevated() {
            advisories.push(Advisory::ElevatedCholesterol);
        }
        if input.glucose.is_elevated() {
            advisories.push(Advisory::ElevatedGlucose);
        }
        if input.smokes {
            advisories.push(Advisory::Smoking);
        }
        if input.drinks_alcohol {
            advisories.push(Advisory::Alcohol);
        }
        if !input.physically_active {
            advisories.push(Advisory::Inactivity);
        }
        if self.rules.regular_checkups && input.age_years >= CHECKUP_AGE {
            advisories.push(Advisory::RegularCheckups);
        }

        if prediction.is_high_risk() {
            advisories.insert(0, Advisory::ConsultDoctor);
        } else {
            advisories.push(Advisory::MaintainHealth);
        }

        advisories
            .into_iter()
            .map(|a| Recommendation::new(a, self.tone))
            .collect()
    }
}

/// Supplied BMI, or one computed from usable measurements.
fn bmi_of(input: &ClinicalInput) -> Option<f64> {
    input.bmi.or_else(|| {
        let usable = |x: f64| x.is_finite() && x > 0.0;
        (usable(input.height_cm) && usable(input.weight_kg))
            .then(|| compute_bmi(input.height_cm, input.weight_kg))
    })
}

fn weight_tier(bmi: f64) -> Option<Advisory> {
    if bmi >= OBESITY_BMI {
        Some(Advisory::Obesity)
    } else if bmi >= OVERWEIGHT_BMI {
        Some(Advisory::Overweight)
    } else {
        None
    }
}
