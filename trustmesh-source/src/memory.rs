//! In-memory attestation source

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use trustmesh_core::Attestation;

use crate::{AttestationSource, SourceError};

/// Attestations indexed by subject
#[derive(Debug, Default)]
pub struct MemorySource {
    by_subject: DashMap<String, Vec<Attestation>>,
    failing: DashSet<String>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of attestations
    pub fn from_attestations<I>(attestations: I) -> Self
    where
        I: IntoIterator<Item = Attestation>,
    {
        let source = Self::new();
        for attestation in attestations {
            source.insert(attestation);
        }
        source
    }

    /// Delay every fetch, for timeout and concurrency tests
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add an attestation, ignoring repeated ids for the same subject
    pub fn insert(&self, attestation: Attestation) {
        let mut entry = self.by_subject.entry(attestation.subject.clone()).or_default();
        if !entry.iter().any(|existing| existing.id == attestation.id) {
            entry.push(attestation);
        }
    }

    /// Make fetches for `identity` fail
    pub fn fail_for(&self, identity: &str) {
        self.failing.insert(identity.to_string());
    }

    /// Clear injected failure for `identity`
    pub fn recover(&self, identity: &str) {
        self.failing.remove(identity);
    }

    /// Fetches served so far, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Subjects with at least one attestation
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.by_subject.iter().map(|e| e.key().clone()).collect();
        subjects.sort();
        subjects
    }

    /// Total stored attestations
    pub fn len(&self) -> usize {
        self.by_subject.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttestationSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_attestations_for(&self, identity: &str) -> Result<Vec<Attestation>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.contains(identity) {
            return Err(SourceError::Unavailable(format!(
                "injected failure for {}",
                identity
            )));
        }

        Ok(self
            .by_subject
            .get(identity)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attest(issuer: &str, subject: &str) -> Attestation {
        Attestation::builder(issuer, subject)
            .attestation_type("general-trust")
            .created_at(1_700_000_000)
            .build()
    }

    #[tokio::test]
    async fn test_fetch_by_subject() {
        let source = MemorySource::from_attestations(vec![
            attest("alice", "bob"),
            attest("carol", "bob"),
            attest("bob", "alice"),
        ]);

        let bob = source.fetch_attestations_for("bob").await.unwrap();
        assert_eq!(bob.len(), 2);
        assert!(bob.iter().all(|a| a.subject == "bob"));

        let nobody = source.fetch_attestations_for("nobody").await.unwrap();
        assert!(nobody.is_empty());

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.subjects(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_stored_once() {
        let source = MemorySource::new();
        source.insert(attest("alice", "bob"));
        source.insert(attest("alice", "bob"));
        assert_eq!(source.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = MemorySource::from_attestations(vec![attest("alice", "bob")]);
        source.fail_for("bob");

        let err = source.fetch_attestations_for("bob").await.unwrap_err();
        assert!(err.is_transient());

        source.recover("bob");
        assert_eq!(source.fetch_attestations_for("bob").await.unwrap().len(), 1);
    }
}
