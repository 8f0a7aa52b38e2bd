//! Engine configuration.
//!
//! Parsed from YAML (or built in code). Durations are human-readable
//! strings such as `"5s"` or `"1h"`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::DEFAULT_MAX_WARNINGS;
use crate::evidence::check_weight;

/// Default time budget for a single validator.
pub const DEFAULT_VALIDATOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Default weight for validators registered without one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Errors from loading or checking a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Influence of each built-in validator on the weighted mean.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeightConfig {
    pub factual: f64,
    pub logical_consistency: f64,
    pub source_attribution: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            factual: 2.0,
            logical_consistency: 1.5,
            source_attribution: 1.5,
        }
    }
}

/// Verdict cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "humantime_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Configuration for a validation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Time budget for validators registered without their own.
    #[serde(with = "humantime_duration")]
    pub default_timeout: Duration,

    /// Maximum warnings kept in a report.
    pub max_warnings: usize,

    pub weights: WeightConfig,

    /// Which built-in validators the default registration installs.
    pub enable_factual: bool,
    pub enable_logical_consistency: bool,
    pub enable_source_attribution: bool,

    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_VALIDATOR_TIMEOUT,
            max_warnings: DEFAULT_MAX_WARNINGS,
            weights: WeightConfig::default(),
            enable_factual: true,
            enable_logical_consistency: true,
            enable_source_attribution: true,
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and check a YAML document. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "default_timeout must be greater than zero".to_string(),
            ));
        }

        for (name, weight) in [
            ("weights.factual", self.weights.factual),
            ("weights.logical_consistency", self.weights.logical_consistency),
            ("weights.source_attribution", self.weights.source_attribution),
        ] {
            check_weight(weight).map_err(|e| ConfigError::Invalid(format!("{}: {}", name, e)))?;
        }

        Ok(())
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
