//! Score aggregation
//!
//! Folds the attestations about one identity into a raw score plus the
//! descriptive statistics reported alongside it. The fold only ever adds
//! non-negative terms, so adding an attestation can never lower the score.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Attestation, ScoringModel};

/// Raw score and statistics for one identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Sum of weighted, decayed, trust-scaled contributions
    pub raw: f64,
    /// Distinct attestations considered
    pub attestation_count: usize,
    /// Distinct issuers other than the subject itself
    pub diversity: usize,
    /// Attestation count per type label
    pub type_breakdown: BTreeMap<String, usize>,
}

impl Aggregate {
    pub fn is_empty(&self) -> bool {
        self.attestation_count == 0
    }
}

/// Aggregate attestations about `identity`
///
/// `trust_of` supplies the propagated trust multiplier for an issuer; values
/// are clamped to `[0, 1]`. Attestations about other subjects and repeated
/// ids are skipped.
pub fn aggregate<F>(
    attestations: &[Attestation],
    identity: &str,
    model: &ScoringModel,
    now: i64,
    mut trust_of: F,
) -> Aggregate
where
    F: FnMut(&str) -> f64,
{
    let mut result = Aggregate::default();
    let mut seen_ids = HashSet::new();
    let mut issuers = HashSet::new();

    for attestation in attestations {
        if attestation.subject != identity || !seen_ids.insert(attestation.id.as_str()) {
            continue;
        }

        result.attestation_count += 1;
        *result
            .type_breakdown
            .entry(attestation.attestation_type.as_str().to_string())
            .or_default() += 1;

        if !attestation.is_self_attestation() {
            issuers.insert(attestation.issuer.as_str());
        }

        let trust = trust_of(&attestation.issuer);
        let trust = if trust.is_nan() { 0.0 } else { trust.clamp(0.0, 1.0) };
        result.raw += model.contribution(attestation, now) * trust;
    }

    result.diversity = issuers.len();
    result
}

/// Aggregate with every issuer except the subject fully trusted
pub fn aggregate_direct(
    attestations: &[Attestation],
    identity: &str,
    model: &ScoringModel,
    now: i64,
) -> Aggregate {
    aggregate(attestations, identity, model, now, |issuer| {
        if issuer == identity {
            0.0
        } else {
            1.0
        }
    })
}
