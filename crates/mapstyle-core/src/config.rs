//! Engine configuration.
//!
//! Tunables that shape filter correction and slot placement. Every key is
//! optional; a missing file or missing key falls back to the defaults.
//!
//! ```toml
//! presence_only_attributes = ["toll"]
//! default_slot = "middle"
//!
//! [similarity]
//! accept_threshold = 0.7
//! weak_threshold = 0.5
//! dominance_ratio = 1.5
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Slots an imports-based style exposes for custom layers.
pub const SLOTS: &[&str] = &["bottom", "middle", "top"];

/// Thresholds for accepting a fuzzy value correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimilarityConfig {
    /// A candidate scoring above this is accepted outright
    pub accept_threshold: f64,
    /// A candidate scoring above this is accepted if it dominates the runner-up
    pub weak_threshold: f64,
    /// Required ratio between the best and second-best score for a weak accept
    pub dominance_ratio: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.7,
            weak_threshold: 0.5,
            dominance_ratio: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Attributes that only exist on some features and are tested with `has`
    pub presence_only_attributes: Vec<String>,
    pub similarity: SimilarityConfig,
    /// Slot used when no placement rule applies
    pub default_slot: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            presence_only_attributes: vec!["toll".to_string()],
            similarity: SimilarityConfig::default(),
            default_slot: "middle".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.similarity;
        for (key, value) in [
            ("accept_threshold", sim.accept_threshold),
            ("weak_threshold", sim.weak_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "similarity.{} must be between 0 and 1, got {}",
                    key, value
                )));
            }
        }
        if sim.weak_threshold > sim.accept_threshold {
            return Err(ConfigError::Invalid(
                "similarity.weak_threshold must not exceed similarity.accept_threshold".to_string(),
            ));
        }
        if sim.dominance_ratio < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "similarity.dominance_ratio must be at least 1, got {}",
                sim.dominance_ratio
            )));
        }
        if !SLOTS.contains(&self.default_slot.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "default_slot must be one of {}, got '{}'",
                SLOTS.join(", "),
                self.default_slot
            )));
        }
        Ok(())
    }

    pub fn is_presence_only(&self, attribute: &str) -> bool {
        self.presence_only_attributes.iter().any(|a| a == attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.is_presence_only("toll"));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            presence_only_attributes = ["toll", "bike_lane"]

            [similarity]
            accept_threshold = 0.8
            "#,
        )
        .unwrap();
        assert!(config.is_presence_only("bike_lane"));
        assert_eq!(config.similarity.accept_threshold, 0.8);
        assert_eq!(config.similarity.weak_threshold, 0.5);
        assert_eq!(config.default_slot, "middle");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_toml_str("presenceOnlyAttributes = []").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("default_slot = \"sideways\"").unwrap_err();
        assert!(err.to_string().contains("default_slot must be one of bottom, middle, top"));

        let err = EngineConfig::from_toml_str("[similarity]\nweak_threshold = 0.9").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
