//! Trust graph view
//!
//! Lazily populated map from identity to its attestation set, shared by
//! every resolution in one call tree. Each identity is fetched at most once:
//! concurrent requests for the same identity wait on the same fetch.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use trustmesh_core::{Attestation, DEFAULT_MAX_CONCURRENT_FETCHES};
use trustmesh_source::SharedSource;

/// Result of fetching one identity's attestations
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Attestations(Arc<Vec<Attestation>>),
    Failed(String),
}

impl FetchOutcome {
    /// Attestations, empty for a failed fetch
    pub fn attestations(&self) -> &[Attestation] {
        match self {
            Self::Attestations(attestations) => attestations,
            Self::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Fetch counters for one graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Successful fetches
    pub fetches: usize,
    /// Failed fetches
    pub failures: usize,
    /// Fetched attestations discarded for naming another subject or no issuer
    pub discarded: usize,
}

/// Fetch cache over an attestation source
pub struct TrustGraph {
    source: SharedSource,
    entries: DashMap<String, Arc<OnceCell<FetchOutcome>>>,
    stats: Mutex<GraphStats>,
    max_concurrent_fetches: usize,
}

impl TrustGraph {
    pub fn new(source: SharedSource) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            stats: Mutex::new(GraphStats::default()),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Pre-populate an identity's attestations; ignored if already known
    pub fn seed(&self, identity: &str, attestations: Vec<Attestation>) {
        let attestations = Self::admit(identity, attestations).0;
        let cell = OnceCell::new_with(Some(FetchOutcome::Attestations(Arc::new(attestations))));
        self.entries
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(cell));
    }

    /// Attestations about `identity`, fetching on first use
    pub async fn attestations_for(&self, identity: &str) -> FetchOutcome {
        let cell = self
            .entries
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        cell.get_or_init(|| self.fetch(identity)).await.clone()
    }

    /// Fetch several identities concurrently
    pub async fn prefetch<'a, I>(&'a self, identities: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        // Boxed up front so the fan-out stays `Send` inside recursive walks
        let fetches: Vec<BoxFuture<'a, FetchOutcome>> = identities
            .into_iter()
            .map(|identity| self.attestations_for(identity).boxed())
            .collect();

        stream::iter(fetches)
            .buffer_unordered(self.max_concurrent_fetches)
            .collect::<Vec<_>>()
            .await;
    }

    /// Whether `identity` has been fetched or seeded
    pub fn is_known(&self, identity: &str) -> bool {
        self.entries
            .get(identity)
            .is_some_and(|cell| cell.initialized())
    }

    /// Identities fetched or seeded so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        *self.stats.lock()
    }

    async fn fetch(&self, identity: &str) -> FetchOutcome {
        match self.source.fetch_attestations_for(identity).await {
            Ok(attestations) => {
                let (admitted, discarded) = Self::admit(identity, attestations);
                debug!(
                    "Fetched {} attestations for {} from {}",
                    admitted.len(),
                    identity,
                    self.source.name()
                );

                let mut stats = self.stats.lock();
                stats.fetches += 1;
                stats.discarded += discarded;
                FetchOutcome::Attestations(Arc::new(admitted))
            }
            Err(e) => {
                warn!(
                    "Fetch for {} from {} failed: {}",
                    identity,
                    self.source.name(),
                    e
                );
                self.stats.lock().failures += 1;
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Keep attestations that name `identity` and have an issuer
    fn admit(identity: &str, attestations: Vec<Attestation>) -> (Vec<Attestation>, usize) {
        let total = attestations.len();
        let admitted: Vec<Attestation> = attestations
            .into_iter()
            .filter(|a| a.subject == identity && !a.issuer.is_empty())
            .collect();
        let discarded = total - admitted.len();
        (admitted, discarded)
    }
}
