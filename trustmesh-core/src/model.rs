//! Decay & weight model
//!
//! Pure functions mapping an attestation's type and age to a contribution:
//! - Type weight from a lookup table with an explicit default
//! - Half-life decay, monotonically non-increasing in age

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Attestation, AttestationType, DEFAULT_HALF_LIFE_DAYS, DEFAULT_TYPE_WEIGHT,
    GENERAL_TRUST_WEIGHT, SECS_PER_DAY, SERVICE_QUALITY_WEIGHT,
};

/// Type weight lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<AttestationType, f64>,
    default_weight: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(AttestationType::service_quality(), SERVICE_QUALITY_WEIGHT);
        weights.insert(AttestationType::general_trust(), GENERAL_TRUST_WEIGHT);

        Self {
            weights,
            default_weight: DEFAULT_TYPE_WEIGHT,
        }
    }
}

impl WeightTable {
    /// Empty table where every label gets `default_weight`
    pub fn with_default(default_weight: f64) -> Self {
        Self {
            weights: BTreeMap::new(),
            default_weight,
        }
    }

    /// Set the weight for a label
    pub fn set(&mut self, label: &str, weight: f64) {
        self.weights.insert(AttestationType::new(label), weight);
    }

    /// Weight for a type, falling back to the default for unknown labels
    pub fn weight_of(&self, attestation_type: &AttestationType) -> f64 {
        self.weights
            .get(attestation_type)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }
}

/// Shape of the decay curve; both equal 0.5 at one half-life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecayCurve {
    /// D(t) = 2^(-t/h)
    #[default]
    Exponential,
    /// D(t) = 1 / (1 + t/h), with a longer tail than exponential
    Hyperbolic,
}

/// Temporal decay policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    half_life_secs: f64,
    curve: DecayCurve,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_LIFE_DAYS * SECS_PER_DAY, DecayCurve::default())
    }
}

impl DecayPolicy {
    /// Create a policy; non-positive or non-finite half-lives fall back to the default
    pub fn new(half_life_secs: f64, curve: DecayCurve) -> Self {
        let half_life_secs = if half_life_secs.is_finite() && half_life_secs > 0.0 {
            half_life_secs
        } else {
            DEFAULT_HALF_LIFE_DAYS * SECS_PER_DAY
        };
        Self {
            half_life_secs,
            curve,
        }
    }

    pub fn half_life_secs(&self) -> f64 {
        self.half_life_secs
    }

    pub fn curve(&self) -> DecayCurve {
        self.curve
    }

    /// Decay factor in (0, 1]; negative ages count as zero
    pub fn decay_of(&self, age_secs: f64) -> f64 {
        let age = if age_secs.is_nan() { 0.0 } else { age_secs.max(0.0) };
        let half_lives = age / self.half_life_secs;

        let factor = match self.curve {
            DecayCurve::Exponential => (-half_lives).exp2(),
            DecayCurve::Hyperbolic => 1.0 / (1.0 + half_lives),
        };

        // Keep strictly positive even for absurd ages
        factor.max(f64::MIN_POSITIVE)
    }
}

/// Combined weight and decay model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringModel {
    pub weights: WeightTable,
    pub decay: DecayPolicy,
}

impl ScoringModel {
    pub fn new(weights: WeightTable, decay: DecayPolicy) -> Self {
        Self { weights, decay }
    }

    pub fn weight_of(&self, attestation_type: &AttestationType) -> f64 {
        self.weights.weight_of(attestation_type)
    }

    pub fn decay_of(&self, age_secs: f64) -> f64 {
        self.decay.decay_of(age_secs)
    }

    /// Undiscounted contribution of one attestation at `now`
    pub fn contribution(&self, attestation: &Attestation, now: i64) -> f64 {
        self.weight_of(&attestation.attestation_type)
            * self.decay_of(attestation.age_secs(now) as f64)
    }
}
