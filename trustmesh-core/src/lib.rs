//! TrustMesh Core - Attestation model and scoring primitives
//!
//! This crate provides the pure, synchronous half of trust scoring:
//! - Attestations and boundary ingestion of relay-shaped records
//! - Type weights and half-life decay
//! - Aggregation of attestations into a raw score with statistics
//! - Normalization of raw scores into a bounded display score

pub mod attestation;
pub mod config;
pub mod model;
pub mod aggregate;
pub mod normalize;
pub mod score;

pub use attestation::*;
pub use config::*;
pub use model::*;
pub use aggregate::*;
pub use normalize::*;
pub use score::*;

/// Seconds in one day
pub const SECS_PER_DAY: f64 = 86_400.0;

/// Default attestation half-life in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 90.0;

/// Weight of a "service-quality" attestation
pub const SERVICE_QUALITY_WEIGHT: f64 = 1.5;

/// Weight of a "general-trust" attestation
pub const GENERAL_TRUST_WEIGHT: f64 = 0.8;

/// Weight for attestation types missing from the weight table
pub const DEFAULT_TYPE_WEIGHT: f64 = 0.5;

/// Normalizer saturation constant `k` in `100 * (1 - e^(-raw/k))`
pub const DEFAULT_SATURATION: f64 = 5.0;

/// Upper bound of the display score
pub const MAX_DISPLAY: u8 = 100;

/// Trust multiplier for a reachable issuer nobody vouches for
pub const DEFAULT_UNVOUCHED_TRUST: f64 = 0.25;

/// Largest depth bound a caller may request
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// Concurrent attestation fetches per graph level
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;
