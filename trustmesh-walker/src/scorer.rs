//! Trust scorer
//!
//! Entry point for scoring identities. A top-level call owns its own
//! [`TrustGraph`] and [`VisitCache`]; nothing is shared between calls.
//!
//! At depth 0 every issuer other than the subject counts fully. At depth
//! `d > 0` each issuer `X` is scaled by a multiplier derived from scoring
//! `X` itself at depth `d - 1`:
//!
//! ```text
//! multiplier(X) = u + (1 - u) * display(X) / 100
//! ```
//!
//! where `u` is the unvouched issuer trust. An issuer already being resolved
//! higher up the call tree, the subject itself, or an issuer whose fetch
//! failed gets a multiplier of zero.
//!
//! An issuer's multiplier depends only on its own attestation subgraph and
//! the current resolution path, never on sibling issuers, so adding an
//! attestation can only raise a score.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use trustmesh_core::{aggregate, Aggregate, Normalizer, ScoreResult, ScoringConfig, ScoringModel};
use trustmesh_source::SharedSource;

use crate::{FetchOutcome, ScoreError, TrustGraph, VisitCache};

/// Validated, non-negative depth bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DepthBound(u32);

impl DepthBound {
    /// Direct attestations only
    pub const DIRECT: Self = Self(0);

    /// Validate a caller-supplied depth against `max`
    pub fn new(depth: i64, max: u32) -> Result<Self, ScoreError> {
        if depth < 0 {
            return Err(ScoreError::NegativeDepth(depth));
        }
        if depth > i64::from(max) {
            return Err(ScoreError::DepthTooLarge {
                requested: depth,
                max,
            });
        }
        Ok(Self(depth as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Outcome of resolving one identity
struct Walk {
    aggregate: Aggregate,
    failed: bool,
    /// Issuers reached below this identity
    visited: HashSet<String>,
}

impl Walk {
    fn failed() -> Self {
        Self {
            aggregate: Aggregate::default(),
            failed: true,
            visited: HashSet::new(),
        }
    }
}

/// Scores identities against an attestation source
pub struct TrustScorer {
    source: SharedSource,
    config: ScoringConfig,
    model: ScoringModel,
    normalizer: Normalizer,
    unvouched_trust: f64,
}

impl TrustScorer {
    /// Create a scorer with default configuration
    pub fn new(source: SharedSource) -> Self {
        Self::with_config(source, ScoringConfig::default())
    }

    /// Create a scorer with custom configuration
    pub fn with_config(source: SharedSource, config: ScoringConfig) -> Self {
        let model = config.model();
        let normalizer = config.normalizer();
        let unvouched_trust = if config.unvouched_issuer_trust.is_nan() {
            0.0
        } else {
            config.unvouched_issuer_trust.clamp(0.0, 1.0)
        };

        Self {
            source,
            config,
            model,
            normalizer,
            unvouched_trust,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Validate a caller-supplied depth bound
    pub fn depth_bound(&self, depth: i64) -> Result<DepthBound, ScoreError> {
        DepthBound::new(depth, self.config.max_depth)
    }

    /// Fresh fetch cache over this scorer's source
    pub fn new_graph(&self) -> TrustGraph {
        TrustGraph::new(self.source.clone())
            .with_max_concurrent_fetches(self.config.max_concurrent_fetches)
    }

    /// Score `identity` as of now
    pub async fn score(&self, identity: &str, depth: i64) -> Result<ScoreResult, ScoreError> {
        self.score_at(identity, depth, Utc::now()).await
    }

    /// Score `identity` as of `now`
    pub async fn score_at(
        &self,
        identity: &str,
        depth: i64,
        now: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoreError> {
        let identity = Self::checked_identity(identity)?;
        let depth = self.depth_bound(depth)?;

        let graph = self.new_graph();
        let mut visits = VisitCache::new();
        Ok(self
            .score_identity(identity, depth, &graph, &mut visits, now)
            .await)
    }

    /// Score several identities as of now
    pub async fn score_many(
        &self,
        identities: &[&str],
        depth: i64,
    ) -> Result<Vec<ScoreResult>, ScoreError> {
        self.score_many_at(identities, depth, Utc::now()).await
    }

    /// Score several identities concurrently as of `now`, each with its own caches
    pub async fn score_many_at(
        &self,
        identities: &[&str],
        depth: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoreResult>, ScoreError> {
        let depth = self.depth_bound(depth)?;
        let identities = identities
            .iter()
            .map(|identity| Self::checked_identity(identity))
            .collect::<Result<Vec<_>, _>>()?;

        let calls = identities.into_iter().map(|identity| async move {
            let graph = self.new_graph();
            let mut visits = VisitCache::new();
            self.score_identity(identity, depth, &graph, &mut visits, now)
                .await
        });

        Ok(join_all(calls).await)
    }

    /// Score `identity` using caller-owned caches
    ///
    /// `graph` and `visits` must belong to a single top-level call.
    pub async fn score_identity(
        &self,
        identity: &str,
        depth: DepthBound,
        graph: &TrustGraph,
        visits: &mut VisitCache,
        now: DateTime<Utc>,
    ) -> ScoreResult {
        let span = info_span!("score", walk = %Uuid::new_v4(), identity = %identity, depth = depth.get());

        async move {
            visits.enter(identity);
            let walk = self
                .resolve(identity, depth.get(), graph, visits, now.timestamp())
                .await;
            visits.leave(identity);

            let stats = graph.stats();
            let result = ScoreResult::from_aggregate(
                identity,
                walk.aggregate,
                &self.normalizer,
                depth.get(),
                now,
            )
            .with_walk_stats(visits.resolved_count(), stats.failures);

            info!(
                "Scored {}: display {} (raw {:.3}, {} attestations, {} issuers, {} failures, {} discarded)",
                identity,
                result.display,
                result.raw,
                result.attestation_count,
                result.diversity,
                result.fetch_failures,
                stats.discarded
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Resolve the aggregate for `identity` with `depth` hops remaining
    fn resolve<'a>(
        &'a self,
        identity: &'a str,
        depth: u32,
        graph: &'a TrustGraph,
        visits: &'a mut VisitCache,
        now: i64,
    ) -> BoxFuture<'a, Walk> {
        Box::pin(async move {
            let outcome = graph.attestations_for(identity).await;
            if let FetchOutcome::Failed(reason) = &outcome {
                debug!("No attestations for {}: {}", identity, reason);
                return Walk::failed();
            }
            visits.mark_resolved(identity);

            let attestations = outcome.attestations();
            let issuers: BTreeSet<&str> = attestations
                .iter()
                .map(|a| a.issuer.as_str())
                .filter(|issuer| *issuer != identity)
                .collect();

            let mut trust: HashMap<&str, f64> = HashMap::with_capacity(issuers.len());
            let mut visited = HashSet::new();
            if depth == 0 {
                trust.extend(issuers.iter().map(|issuer| (*issuer, 1.0)));
            } else {
                let pending: Vec<&str> = issuers
                    .iter()
                    .copied()
                    .filter(|issuer| {
                        !visits.is_active(issuer) && visits.lookup(issuer, depth - 1).is_none()
                    })
                    .collect();
                graph.prefetch(pending).await;

                for issuer in issuers.iter().copied() {
                    let (multiplier, reached) = self
                        .issuer_trust(issuer, depth - 1, graph, visits, now)
                        .await;
                    visited.extend(reached);
                    trust.insert(issuer, multiplier);
                }
            }

            let aggregate = aggregate(attestations, identity, &self.model, now, |issuer| {
                trust.get(issuer).copied().unwrap_or(0.0)
            });
            Walk {
                aggregate,
                failed: false,
                visited,
            }
        })
    }

    /// Trust multiplier for `issuer`, resolved with `depth` hops remaining,
    /// and the identities the resolution reached
    async fn issuer_trust(
        &self,
        issuer: &str,
        depth: u32,
        graph: &TrustGraph,
        visits: &mut VisitCache,
        now: i64,
    ) -> (f64, HashSet<String>) {
        if visits.is_active(issuer) {
            debug!("Cycle through {}, contributing no trust", issuer);
            return (0.0, HashSet::from([issuer.to_string()]));
        }
        if let Some(resolved) = visits.lookup(issuer, depth) {
            return (resolved.multiplier, resolved.visited.clone());
        }

        visits.enter(issuer);
        let walk = self.resolve(issuer, depth, graph, visits, now).await;
        visits.leave(issuer);

        let multiplier = if walk.failed {
            0.0
        } else {
            let fraction = self.normalizer.fraction(walk.aggregate.raw);
            self.unvouched_trust + (1.0 - self.unvouched_trust) * fraction
        };
        debug!(
            "Issuer {} resolved at depth {}: multiplier {:.3}",
            issuer, depth, multiplier
        );

        let mut reached = walk.visited;
        reached.insert(issuer.to_string());
        visits.record(issuer, depth, multiplier, reached.clone());
        (multiplier, reached)
    }

    fn checked_identity(identity: &str) -> Result<&str, ScoreError> {
        let identity = identity.trim();
        if identity.is_empty() {
            Err(ScoreError::EmptyIdentity)
        } else {
            Ok(identity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trustmesh_core::{Attestation, AttestationType, TrustTier, SECS_PER_DAY};
    use trustmesh_source::MemorySource;

    const NOW_SECS: i64 = 1_700_000_000;
    const HALF_LIFE_SECS: i64 = 90 * SECS_PER_DAY as i64;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW_SECS, 0).unwrap()
    }

    fn attest(issuer: &str, subject: &str, label: &str, age_secs: i64) -> Attestation {
        Attestation::builder(issuer, subject)
            .attestation_type(label)
            .aged(NOW_SECS, age_secs)
            .content(&format!("{} vouches for {}", issuer, subject))
            .build()
    }

    fn scorer(attestations: Vec<Attestation>) -> (TrustScorer, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::from_attestations(attestations));
        (TrustScorer::new(source.clone()), source)
    }

    async fn display(attestations: Vec<Attestation>, identity: &str, depth: i64) -> u8 {
        let (scorer, _) = scorer(attestations);
        scorer.score_at(identity, depth, now()).await.unwrap().display
    }

    #[tokio::test]
    async fn test_no_attestations_scores_zero() {
        for depth in [0, 1, 3] {
            let (scorer, _) = scorer(vec![]);
            let result = scorer.score_at("P", depth, now()).await.unwrap();
            assert_eq!(result.raw, 0.0);
            assert_eq!(result.display, 0);
            assert_eq!(result.tier, TrustTier::None);
            assert_eq!(result.attestation_count, 0);
            assert_eq!(result.diversity, 0);
        }
    }

    #[tokio::test]
    async fn test_direct_scoring_scenario() {
        let sq = attest("alice", "P", AttestationType::SERVICE_QUALITY, 0);
        let gt = attest("bob", "P", AttestationType::GENERAL_TRUST, 0);
        let sq_aged = attest("alice", "P", AttestationType::SERVICE_QUALITY, HALF_LIFE_SECS);

        let single = display(vec![sq.clone()], "P", 0).await;
        assert!(single > 0);

        let both = display(vec![sq, gt], "P", 0).await;
        assert!(both > single);

        let aged = display(vec![sq_aged], "P", 0).await;
        assert!(aged <= single);

        assert_eq!(display(vec![], "P", 0).await, 0);
    }

    #[tokio::test]
    async fn test_result_statistics() {
        let (scorer, _) = scorer(vec![
            attest("alice", "P", AttestationType::SERVICE_QUALITY, 0),
            attest("alice", "P", AttestationType::GENERAL_TRUST, 10),
            attest("bob", "P", AttestationType::GENERAL_TRUST, 0),
            attest("carol", "someone-else", AttestationType::GENERAL_TRUST, 0),
        ]);

        let result = scorer.score_at("P", 0, now()).await.unwrap();
        assert_eq!(result.identity, "P");
        assert_eq!(result.attestation_count, 3);
        assert_eq!(result.diversity, 2);
        assert_eq!(result.type_breakdown.get("general-trust"), Some(&2));
        assert_eq!(result.type_breakdown.get("service-quality"), Some(&1));
        assert_eq!(result.depth, 0);
        assert_eq!(result.fetch_failures, 0);
    }

    #[tokio::test]
    async fn test_type_ordering() {
        let sq = display(vec![attest("alice", "P", AttestationType::SERVICE_QUALITY, 0)], "P", 0).await;
        let gt = display(vec![attest("alice", "P", AttestationType::GENERAL_TRUST, 0)], "P", 0).await;
        let unknown = display(vec![attest("alice", "P", "vibes", 0)], "P", 0).await;

        assert!(sq >= gt);
        assert!(gt >= unknown);
        assert!(unknown > 0);
    }

    #[tokio::test]
    async fn test_decay_is_monotone_in_age() {
        let mut previous = u8::MAX;
        for days in [0, 30, 89, 90, 91, 180, 365, 3650] {
            let age = days * SECS_PER_DAY as i64;
            let current = display(
                vec![attest("alice", "P", AttestationType::SERVICE_QUALITY, age)],
                "P",
                0,
            )
            .await;
            assert!(current <= previous);
            assert!(current > 0);
            previous = current;
        }
    }

    #[tokio::test]
    async fn test_adding_attestations_is_monotone() {
        let pool = vec![
            attest("alice", "P", AttestationType::GENERAL_TRUST, 0),
            attest("bob", "P", AttestationType::SERVICE_QUALITY, HALF_LIFE_SECS),
            attest("carol", "P", "mystery", 5 * HALF_LIFE_SECS),
            attest("P", "P", AttestationType::SERVICE_QUALITY, 0),
        ];

        for depth in [0, 2] {
            let mut previous = (0.0, 0);
            for n in 1..=pool.len() {
                let (scorer, _) = scorer(pool[..n].to_vec());
                let result = scorer.score_at("P", depth, now()).await.unwrap();
                assert!(result.raw >= previous.0);
                assert!(result.display >= previous.1);
                previous = (result.raw, result.display);
            }
        }
    }

    /// B and W vouch along a chain into P, while A and W vouch for each other
    fn tangled_graph() -> Vec<Attestation> {
        vec![
            attest("B", "P", AttestationType::SERVICE_QUALITY, 0),
            attest("W", "B", AttestationType::SERVICE_QUALITY, 0),
            attest("A", "W", AttestationType::SERVICE_QUALITY, 0),
            attest("W", "A", AttestationType::SERVICE_QUALITY, 0),
        ]
    }

    #[tokio::test]
    async fn test_new_issuer_in_cycle_does_not_lower_score() {
        let mut extended = tangled_graph();
        extended.push(attest("A", "P", AttestationType::GENERAL_TRUST, 3650 * SECS_PER_DAY as i64));

        let (base_scorer, _) = scorer(tangled_graph());
        let (extended_scorer, _) = scorer(extended);
        let base = base_scorer.score_at("P", 3, now()).await.unwrap();
        let with_a = extended_scorer.score_at("P", 3, now()).await.unwrap();

        // B <- W <- A, each resolved without cuts: 1.5 * (0.25 + 0.75 * 0.10)
        assert!((base.raw - 0.4875).abs() < 1e-9);
        assert_eq!(base.display, 10);
        assert!(with_a.raw >= base.raw);
        assert!(with_a.display >= base.display);
        assert_eq!(with_a.diversity, 2);
    }

    #[tokio::test]
    async fn test_issuer_names_do_not_change_score() {
        let rename = |id: &str| match id {
            "A" => "Z".to_string(),
            other => other.to_string(),
        };
        let mut original = tangled_graph();
        original.push(attest("A", "P", AttestationType::GENERAL_TRUST, 0));
        let renamed: Vec<Attestation> = original
            .iter()
            .map(|a| {
                attest(
                    &rename(&a.issuer),
                    &rename(&a.subject),
                    a.attestation_type.as_str(),
                    NOW_SECS - a.created_at,
                )
            })
            .collect();

        for depth in 1..=4 {
            let (a_scorer, _) = scorer(original.clone());
            let (z_scorer, _) = scorer(renamed.clone());
            let a = a_scorer.score_at("P", depth, now()).await.unwrap();
            let z = z_scorer.score_at("P", depth, now()).await.unwrap();
            assert!((a.raw - z.raw).abs() < 1e-12, "depth {}", depth);
            assert_eq!(a.display, z.display);
        }
    }

    #[tokio::test]
    async fn test_adding_attestations_in_cyclic_graph_is_monotone() {
        let mut background = tangled_graph();
        background.extend([
            attest("B", "A", AttestationType::GENERAL_TRUST, 0),
            attest("C", "B", AttestationType::GENERAL_TRUST, 10 * SECS_PER_DAY as i64),
            attest("P", "C", AttestationType::SERVICE_QUALITY, 0),
            attest("A", "C", AttestationType::GENERAL_TRUST, 0),
        ]);
        let pool = vec![
            attest("A", "P", AttestationType::GENERAL_TRUST, 3650 * SECS_PER_DAY as i64),
            attest("C", "P", AttestationType::GENERAL_TRUST, 30 * SECS_PER_DAY as i64),
            attest("W", "P", "mystery", 0),
            attest("P", "P", AttestationType::SERVICE_QUALITY, 0),
        ];

        for depth in 1..=5 {
            let mut previous = (0.0, 0);
            for n in 0..=pool.len() {
                let mut atts = background.clone();
                atts.extend(pool[..n].iter().cloned());
                let (scorer, _) = scorer(atts);
                let result = scorer.score_at("P", depth, now()).await.unwrap();
                assert!(result.raw >= previous.0, "depth {} with {} added", depth, n);
                assert!(result.display >= previous.1, "depth {} with {} added", depth, n);
                previous = (result.raw, result.display);
            }
        }
    }

    #[tokio::test]
    async fn test_self_attestation_never_helps() {
        let honest = vec![attest("alice", "P", AttestationType::GENERAL_TRUST, 0)];
        let mut boosted = honest.clone();
        boosted.push(attest("P", "P", AttestationType::SERVICE_QUALITY, 0));

        for depth in [0, 1, 3] {
            let (honest_scorer, _) = scorer(honest.clone());
            let (boosted_scorer, _) = scorer(boosted.clone());
            let a = honest_scorer.score_at("P", depth, now()).await.unwrap();
            let b = boosted_scorer.score_at("P", depth, now()).await.unwrap();
            assert_eq!(a.raw, b.raw);
            assert_eq!(b.diversity, 1);
        }

        let only_self = vec![attest("P", "P", AttestationType::SERVICE_QUALITY, 0)];
        assert_eq!(display(only_self, "P", 0).await, 0);
    }

    #[tokio::test]
    async fn test_mutual_attestation_cycle_terminates() {
        let atts = vec![
            attest("A", "B", AttestationType::GENERAL_TRUST, 0),
            attest("B", "A", AttestationType::GENERAL_TRUST, 0),
        ];
        let (scorer, _) = scorer(atts);

        let direct = scorer.score_at("A", 0, now()).await.unwrap();
        for depth in [2, 3, 8] {
            let walked = scorer.score_at("A", depth, now()).await.unwrap();
            assert!(walked.raw.is_finite());
            assert!(walked.raw <= direct.raw);
            assert!(walked.display > 0);
        }
    }

    #[tokio::test]
    async fn test_longer_cycle_terminates() {
        let atts = vec![
            attest("A", "B", AttestationType::SERVICE_QUALITY, 0),
            attest("B", "C", AttestationType::SERVICE_QUALITY, 0),
            attest("C", "A", AttestationType::SERVICE_QUALITY, 0),
            attest("C", "B", AttestationType::GENERAL_TRUST, 0),
        ];
        let (scorer, source) = scorer(atts);

        let result = scorer.score_at("A", 8, now()).await.unwrap();
        assert!(result.raw.is_finite());
        assert!(result.raw <= 1.5);
        assert!(source.fetch_count() <= 3);
    }

    #[tokio::test]
    async fn test_depth_saturates_past_chain_length() {
        // Z -> Y -> X -> P
        let atts = vec![
            attest("X", "P", AttestationType::SERVICE_QUALITY, 0),
            attest("Y", "X", AttestationType::GENERAL_TRUST, 0),
            attest("Z", "Y", AttestationType::SERVICE_QUALITY, 0),
            attest("W", "P", AttestationType::GENERAL_TRUST, 30 * SECS_PER_DAY as i64),
        ];
        let (scorer, _) = scorer(atts);

        let saturated = scorer.score_at("P", 3, now()).await.unwrap();
        for depth in [4, 5, 8] {
            let deeper = scorer.score_at("P", depth, now()).await.unwrap();
            assert_eq!(deeper.raw, saturated.raw);
            assert_eq!(deeper.display, saturated.display);
        }
    }

    #[tokio::test]
    async fn test_trusted_issuers_count_more() {
        let mut atts = vec![
            attest("vouched", "P", AttestationType::GENERAL_TRUST, 0),
            attest("stranger", "Q", AttestationType::GENERAL_TRUST, 0),
        ];
        for i in 0..3 {
            atts.push(attest(
                &format!("w{}", i),
                "vouched",
                AttestationType::SERVICE_QUALITY,
                0,
            ));
        }
        let (scorer, _) = scorer(atts);

        let p = scorer.score_at("P", 1, now()).await.unwrap();
        let q = scorer.score_at("Q", 1, now()).await.unwrap();
        assert!(p.raw > q.raw);
        assert!(q.display > 0);

        // 0.8 * (0.25 + 0.75 * 0.60)
        assert!((p.raw - 0.56).abs() < 1e-9);
        // 0.8 * 0.25
        assert!((q.raw - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_each_identity_fetched_once() {
        // diamond: C -> A -> P, C -> B -> P
        let atts = vec![
            attest("A", "P", AttestationType::GENERAL_TRUST, 0),
            attest("B", "P", AttestationType::GENERAL_TRUST, 0),
            attest("C", "A", AttestationType::SERVICE_QUALITY, 0),
            attest("C", "B", AttestationType::SERVICE_QUALITY, 0),
        ];
        let (scorer, source) = scorer(atts);

        let result = scorer.score_at("P", 3, now()).await.unwrap();
        assert_eq!(source.fetch_count(), 4);
        assert_eq!(result.identities_resolved, 4);
    }

    #[tokio::test]
    async fn test_issuer_fetch_failure_degrades_locally() {
        let atts = vec![
            attest("flaky", "P", AttestationType::SERVICE_QUALITY, 0),
            attest("steady", "P", AttestationType::GENERAL_TRUST, 0),
        ];
        let (scorer, source) = scorer(atts);
        source.fail_for("flaky");

        let result = scorer.score_at("P", 1, now()).await.unwrap();
        assert_eq!(result.fetch_failures, 1);
        assert_eq!(result.attestation_count, 2);
        // only steady counts: 0.8 * 0.25
        assert!((result.raw - 0.2).abs() < 1e-9);
        assert!(result.display > 0);
    }

    #[tokio::test]
    async fn test_subject_fetch_failure_is_zero_not_error() {
        let (scorer, source) = scorer(vec![attest("alice", "P", AttestationType::GENERAL_TRUST, 0)]);
        source.fail_for("P");

        let result = scorer.score_at("P", 2, now()).await.unwrap();
        assert_eq!(result.display, 0);
        assert_eq!(result.fetch_failures, 1);
        assert_eq!(result.identities_resolved, 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected() {
        let (scorer, _) = scorer(vec![]);

        assert_eq!(
            scorer.score_at("P", -1, now()).await.unwrap_err(),
            ScoreError::NegativeDepth(-1)
        );
        assert_eq!(
            scorer.score_at("P", 99, now()).await.unwrap_err(),
            ScoreError::DepthTooLarge {
                requested: 99,
                max: trustmesh_core::DEFAULT_MAX_DEPTH
            }
        );
        assert_eq!(
            scorer.score_at("   ", 0, now()).await.unwrap_err(),
            ScoreError::EmptyIdentity
        );
    }

    #[tokio::test]
    async fn test_caller_supplied_graph_is_reused() {
        let (scorer, source) = scorer(vec![]);
        let graph = scorer.new_graph();
        graph.seed("P", vec![attest("alice", "P", AttestationType::SERVICE_QUALITY, 0)]);

        let mut visits = VisitCache::new();
        let result = scorer
            .score_identity("P", DepthBound::DIRECT, &graph, &mut visits, now())
            .await;

        assert!(result.display > 0);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_score_many_keeps_order() {
        let (scorer, _) = scorer(vec![
            attest("alice", "P", AttestationType::SERVICE_QUALITY, 0),
            attest("alice", "Q", AttestationType::GENERAL_TRUST, 0),
        ]);

        let results = scorer.score_many_at(&["P", "Q", "R"], 1, now()).await.unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(names, vec!["P", "Q", "R"]);
        assert!(results[0].display > results[1].display);
        assert_eq!(results[2].display, 0);

        let single = scorer.score_at("Q", 1, now()).await.unwrap();
        assert_eq!(results[1].raw, single.raw);

        assert!(scorer.score_many_at(&["P", ""], 1, now()).await.is_err());
        assert!(scorer.score_many(&["P"], -1).await.is_err());
    }

    #[tokio::test]
    async fn test_result_serializes() {
        let (scorer, _) = scorer(vec![attest("alice", "P", AttestationType::SERVICE_QUALITY, 0)]);
        let result = scorer.score_at("P", 0, now()).await.unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["display"], 26);
        assert_eq!(json["attestation_count"], 1);
    }
}
