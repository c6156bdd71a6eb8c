//! Scoring configuration
//!
//! Loaded from TOML, for example:
//!
//! ```toml
//! half_life_days = 90.0
//! decay_curve = "exponential"
//! saturation = 5.0
//! unvouched_issuer_trust = 0.25
//! max_depth = 8
//!
//! [weights]
//! default = 0.5
//! "service-quality" = 1.5
//! "general-trust" = 0.8
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AttestationType, DecayCurve, DecayPolicy, Normalizer, ScoringModel, WeightTable,
    DEFAULT_HALF_LIFE_DAYS, DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_MAX_DEPTH,
    DEFAULT_SATURATION, DEFAULT_TYPE_WEIGHT, DEFAULT_UNVOUCHED_TRUST, GENERAL_TRUST_WEIGHT,
    SECS_PER_DAY, SERVICE_QUALITY_WEIGHT,
};

/// Key in the `[weights]` table holding the fallback weight
const DEFAULT_WEIGHT_KEY: &str = "default";

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: &str) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Tunable scoring parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Attestation half-life in days
    pub half_life_days: f64,
    /// Decay curve shape
    pub decay_curve: DecayCurve,
    /// Normalizer saturation constant
    pub saturation: f64,
    /// Multiplier floor for a reachable issuer with no trust of its own
    pub unvouched_issuer_trust: f64,
    /// Largest depth bound accepted from callers
    pub max_depth: u32,
    /// Concurrent attestation fetches per level of the graph walk
    pub max_concurrent_fetches: usize,
    /// Label -> weight; the `default` key sets the fallback weight
    pub weights: BTreeMap<String, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(DEFAULT_WEIGHT_KEY.to_string(), DEFAULT_TYPE_WEIGHT);
        weights.insert(
            AttestationType::SERVICE_QUALITY.to_string(),
            SERVICE_QUALITY_WEIGHT,
        );
        weights.insert(
            AttestationType::GENERAL_TRUST.to_string(),
            GENERAL_TRUST_WEIGHT,
        );

        Self {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            decay_curve: DecayCurve::default(),
            saturation: DEFAULT_SATURATION,
            unvouched_issuer_trust: DEFAULT_UNVOUCHED_TRUST,
            max_depth: DEFAULT_MAX_DEPTH,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            weights,
        }
    }
}

impl ScoringConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded scoring config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.half_life_days.is_finite() && self.half_life_days > 0.0) {
            return Err(ConfigError::invalid("half_life_days", "must be positive"));
        }
        if !(self.saturation.is_finite() && self.saturation > 0.0) {
            return Err(ConfigError::invalid("saturation", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.unvouched_issuer_trust) {
            return Err(ConfigError::invalid(
                "unvouched_issuer_trust",
                "must be within [0, 1]",
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::invalid(
                "max_concurrent_fetches",
                "must be at least 1",
            ));
        }
        for (label, weight) in &self.weights {
            if !(weight.is_finite() && *weight > 0.0) {
                return Err(ConfigError::invalid(
                    &format!("weights.{}", label),
                    "must be positive",
                ));
            }
        }
        Ok(())
    }

    pub fn weight_table(&self) -> WeightTable {
        let default_weight = self
            .weights
            .get(DEFAULT_WEIGHT_KEY)
            .copied()
            .unwrap_or(DEFAULT_TYPE_WEIGHT);

        let mut table = WeightTable::with_default(default_weight);
        for (label, weight) in &self.weights {
            if label != DEFAULT_WEIGHT_KEY {
                table.set(label, *weight);
            }
        }
        table
    }

    pub fn decay_policy(&self) -> DecayPolicy {
        DecayPolicy::new(self.half_life_days * SECS_PER_DAY, self.decay_curve)
    }

    pub fn model(&self) -> ScoringModel {
        ScoringModel::new(self.weight_table(), self.decay_policy())
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.saturation)
    }
}
