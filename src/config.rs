//! Process settings read from `CARDIORISK_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `CARDIORISK_BIND_ADDR` | `0.0.0.0:5000` |
//! | `CARDIORISK_MODEL_PATH` | `models/cardio_model.json` |
//! | `CARDIORISK_REQUIRE_MODEL_MANIFEST` | `false` |
//! | `CARDIORISK_EAGER_MODEL_LOAD` | `false` |
//! | `CARDIORISK_AGE_GROUPING` | `four` (`four` or `five`); derivation only, a supplied `age_group` 0-4 is always accepted |
//! | `CARDIORISK_DERIVED_FIELDS` | `derive` (`derive` or `neutral`) |
//! | `CARDIORISK_REGULAR_CHECKUPS` | `true` |
//! | `CARDIORISK_ADVISORY_TONE` | `detailed` (`detailed` or `brief`) |
//! | `CARDIORISK_LOG_MODE` | `stdout` (`stdout` or `file`) |
//! | `CARDIORISK_LOG_FILE` | `cardiorisk.log` |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::adapters::logistic::Integrity;
use crate::domain::{
    AdvisoryTone, AgeGrouping, DerivedFieldPolicy, FeatureEncoder, RecommendationEngine, RuleSet,
};

const PREFIX: &str = "CARDIORISK_";

/// Errors reading settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub model_path: PathBuf,
    pub require_model_manifest: bool,
    pub eager_model_load: bool,
    pub age_grouping: AgeGrouping,
    pub derived_fields: DerivedFieldPolicy,
    pub regular_checkups: bool,
    pub advisory_tone: AdvisoryTone,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            model_path: PathBuf::from("models/cardio_model.json"),
            require_model_manifest: false,
            eager_model_load: false,
            age_grouping: AgeGrouping::FourBucket,
            derived_fields: DerivedFieldPolicy::Derive,
            regular_checkups: true,
            advisory_tone: AdvisoryTone::Detailed,
            log_mode: LogMode::Stdout,
            log_file: PathBuf::from("cardiorisk.log"),
        }
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{PREFIX}{key}"),
        value: value.to_string(),
        expected,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        _ => Err(invalid(key, value, "a boolean")),
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for any variable that is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (full variable name in,
    /// value out).
    ///
    /// # Errors
    /// Returns `ConfigError` for any value that is present but unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{PREFIX}{key}"));
        let mut settings = Self::default();

        if let Some(v) = get("BIND_ADDR") {
            settings.bind_addr = v
                .trim()
                .parse()
                .map_err(|_| invalid("BIND_ADDR", &v, "host:port"))?;
        }
        if let Some(v) = get("MODEL_PATH") {
            settings.model_path = PathBuf::from(v.trim());
        }
        if let Some(v) = get("REQUIRE_MODEL_MANIFEST") {
            settings.require_model_manifest = parse_bool("REQUIRE_MODEL_MANIFEST", &v)?;
        }
        if let Some(v) = get("EAGER_MODEL_LOAD") {
            settings.eager_model_load = parse_bool("EAGER_MODEL_LOAD", &v)?;
        }
        if let Some(v) = get("AGE_GROUPING") {
            settings.age_grouping = match v.trim() {
                "four" | "4" => AgeGrouping::FourBucket,
                "five" | "5" => AgeGrouping::FiveBucket,
                _ => return Err(invalid("AGE_GROUPING", &v, "four or five")),
            };
        }
        if let Some(v) = get("DERIVED_FIELDS") {
            settings.derived_fields = match v.trim() {
                "derive" => DerivedFieldPolicy::Derive,
                "neutral" => DerivedFieldPolicy::Neutral,
                _ => return Err(invalid("DERIVED_FIELDS", &v, "derive or neutral")),
            };
        }
        if let Some(v) = get("REGULAR_CHECKUPS") {
            settings.regular_checkups = parse_bool("REGULAR_CHECKUPS", &v)?;
        }
        if let Some(v) = get("ADVISORY_TONE") {
            settings.advisory_tone = match v.trim() {
                "detailed" => AdvisoryTone::Detailed,
                "brief" => AdvisoryTone::Brief,
                _ => return Err(invalid("ADVISORY_TONE", &v, "detailed or brief")),
            };
        }
        if let Some(v) = get("LOG_MODE") {
            settings.log_mode = match v.trim() {
                "stdout" => LogMode::Stdout,
                "file" => LogMode::File,
                _ => return Err(invalid("LOG_MODE", &v, "stdout or file")),
            };
        }
        if let Some(v) = get("LOG_FILE") {
            settings.log_file = PathBuf::from(v.trim());
        }

        Ok(settings)
    }

    #[must_use]
    pub fn integrity(&self) -> Integrity {
        if self.require_model_manifest {
            Integrity::Required
        } else {
            Integrity::Optional
        }
    }

    #[must_use]
    pub fn encoder(&self) -> FeatureEncoder {
        FeatureEncoder::new(self.age_grouping, self.derived_fields)
    }

    #[must_use]
    pub fn recommendation_engine(&self) -> RecommendationEngine {
        RecommendationEngine::new(
            RuleSet {
                regular_checkups: self.regular_checkups,
            },
            self.advisory_tone,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("{PREFIX}{k}"), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = from_pairs(&[]).expect("Defaults are valid");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind_addr.port(), 5000);
        assert_eq!(settings.integrity(), Integrity::Optional);
        assert!(settings.recommendation_engine().rules().regular_checkups);
    }

    #[test]
    fn test_overrides() {
        let settings = from_pairs(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("MODEL_PATH", "/srv/model.json"),
            ("REQUIRE_MODEL_MANIFEST", "yes"),
            ("AGE_GROUPING", "five"),
            ("DERIVED_FIELDS", "neutral"),
            ("REGULAR_CHECKUPS", "false"),
            ("ADVISORY_TONE", "brief"),
            ("LOG_MODE", "file"),
        ])
        .expect("Should parse");

        assert_eq!(settings.bind_addr.port(), 8080);
        assert_eq!(settings.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(settings.integrity(), Integrity::Required);
        assert_eq!(settings.encoder().grouping(), AgeGrouping::FiveBucket);
        assert_eq!(settings.encoder().policy(), DerivedFieldPolicy::Neutral);
        assert!(!settings.recommendation_engine().rules().regular_checkups);
        assert_eq!(settings.advisory_tone, AdvisoryTone::Brief);
        assert_eq!(settings.log_mode, LogMode::File);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = from_pairs(&[("AGE_GROUPING", "six")]).expect_err("Must reject");
        assert!(err.to_string().contains("CARDIORISK_AGE_GROUPING"));

        assert!(from_pairs(&[("BIND_ADDR", "nowhere")]).is_err());
        assert!(from_pairs(&[("EAGER_MODEL_LOAD", "maybe")]).is_err());
    }
}
