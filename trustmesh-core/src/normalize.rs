//! Score normalization
//!
//! Maps an unbounded raw score onto the 0-100 display range with a
//! saturating curve: `display = ceil(100 * (1 - e^(-raw/k)))`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_SATURATION, MAX_DISPLAY};

/// Saturating raw -> display mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    saturation: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SATURATION)
    }
}

impl Normalizer {
    /// Create a normalizer; invalid constants fall back to the default
    pub fn new(saturation: f64) -> Self {
        let saturation = if saturation.is_finite() && saturation > 0.0 {
            saturation
        } else {
            DEFAULT_SATURATION
        };
        Self { saturation }
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Display score in `[0, 100]`; zero only for a zero raw score
    pub fn normalize(&self, raw: f64) -> u8 {
        if raw.is_nan() || raw <= 0.0 {
            return 0;
        }
        let scaled = f64::from(MAX_DISPLAY) * (1.0 - (-raw / self.saturation).exp());
        scaled.ceil().clamp(1.0, f64::from(MAX_DISPLAY)) as u8
    }

    /// Display score as a fraction in `[0, 1]`
    pub fn fraction(&self, raw: f64) -> f64 {
        f64::from(self.normalize(raw)) / f64::from(MAX_DISPLAY)
    }
}

/// Coarse label for a display score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    None,
    Low,
    Medium,
    High,
}

impl TrustTier {
    pub fn from_display(display: u8) -> Self {
        match display {
            0 => Self::None,
            1..=29 => Self::Low,
            30..=69 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}
