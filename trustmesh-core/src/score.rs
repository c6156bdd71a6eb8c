//! Score results returned to callers

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Aggregate, Normalizer, TrustTier};

/// Trust score for one identity, serializable as a flat record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Identity that was scored
    pub identity: String,
    /// Unbounded accumulated score
    pub raw: f64,
    /// Bounded display score (0-100)
    pub display: u8,
    /// Coarse label for `display`
    pub tier: TrustTier,
    /// Direct attestations considered
    pub attestation_count: usize,
    /// Distinct issuers contributing
    pub diversity: usize,
    /// Attestation count per type
    pub type_breakdown: BTreeMap<String, usize>,
    /// Depth bound used for the walk
    pub depth: u32,
    /// Distinct identities fetched and walked, the scored identity included
    pub identities_resolved: usize,
    /// Attestation fetches that failed during the walk
    pub fetch_failures: usize,
    /// When the score was computed
    pub scored_at: DateTime<Utc>,
}

impl ScoreResult {
    /// Build a result from an aggregate
    pub fn from_aggregate(
        identity: &str,
        aggregate: Aggregate,
        normalizer: &Normalizer,
        depth: u32,
        scored_at: DateTime<Utc>,
    ) -> Self {
        let display = normalizer.normalize(aggregate.raw);
        Self {
            identity: identity.to_string(),
            raw: aggregate.raw,
            display,
            tier: TrustTier::from_display(display),
            attestation_count: aggregate.attestation_count,
            diversity: aggregate.diversity,
            type_breakdown: aggregate.type_breakdown,
            depth,
            identities_resolved: 0,
            fetch_failures: 0,
            scored_at,
        }
    }

    /// Zero score for an identity with no usable attestations
    pub fn empty(identity: &str, depth: u32, scored_at: DateTime<Utc>) -> Self {
        Self::from_aggregate(
            identity,
            Aggregate::default(),
            &Normalizer::default(),
            depth,
            scored_at,
        )
    }

    pub fn with_walk_stats(mut self, identities_resolved: usize, fetch_failures: usize) -> Self {
        self.identities_resolved = identities_resolved;
        self.fetch_failures = fetch_failures;
        self
    }
}
