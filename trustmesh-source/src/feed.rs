//! Feed file source
//!
//! Loads relay-shaped attestation records from disk, either as one JSON
//! array or as JSON lines, and resolves them at the boundary.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use trustmesh_core::{ingest, Attestation, AttestationType, RawAttestation};

use crate::{AttestationSource, MemorySource, SourceError};

/// Summary of a loaded feed
#[derive(Debug, Clone, Default)]
pub struct FeedSummary {
    /// Attestations accepted
    pub accepted: usize,
    /// Records dropped, by reason
    pub dropped: BTreeMap<String, usize>,
    /// Accepted attestations per type label
    pub types: BTreeMap<String, usize>,
    /// Distinct subjects
    pub subjects: usize,
}

impl FeedSummary {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Attestations loaded from a feed
#[derive(Debug)]
pub struct FeedSource {
    index: MemorySource,
    summary: FeedSummary,
}

impl FeedSource {
    /// Load a feed file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        debug!("Loading feed: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let feed = Self::from_json(&content)?;
        info!(
            "Loaded {} attestations from {} ({} dropped)",
            feed.summary.accepted,
            path.display(),
            feed.summary.dropped_total()
        );
        Ok(feed)
    }

    /// Parse a feed from a JSON array or JSON-lines document
    pub fn from_json(content: &str) -> Result<Self, SourceError> {
        let mut unparsable = 0;

        let raws: Vec<RawAttestation> = if content.trim_start().starts_with('[') {
            serde_json::from_str(content)?
        } else {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .filter_map(|line| match serde_json::from_str::<RawAttestation>(line) {
                    Ok(raw) => Some(raw),
                    Err(e) => {
                        warn!("Skipping unparsable feed line: {}", e);
                        unparsable += 1;
                        None
                    }
                })
                .collect()
        };

        Ok(Self::from_raw(raws, unparsable))
    }

    fn from_raw(raws: Vec<RawAttestation>, unparsable: usize) -> Self {
        let report = ingest(raws);

        let mut summary = FeedSummary {
            accepted: report.accepted.len(),
            dropped: report
                .dropped
                .iter()
                .map(|(reason, count)| (reason.to_string(), *count))
                .collect(),
            ..Default::default()
        };
        if unparsable > 0 {
            summary.dropped.insert("unparsable".to_string(), unparsable);
        }
        for attestation in &report.accepted {
            *summary
                .types
                .entry(attestation.attestation_type.to_string())
                .or_default() += 1;
        }

        let index = MemorySource::from_attestations(report.accepted);
        summary.subjects = index.subjects().len();

        Self { index, summary }
    }

    pub fn summary(&self) -> &FeedSummary {
        &self.summary
    }

    pub fn subjects(&self) -> Vec<String> {
        self.index.subjects()
    }

    /// Accepted attestations carrying `attestation_type`
    pub fn count_of(&self, attestation_type: &AttestationType) -> usize {
        self.summary
            .types
            .get(attestation_type.as_str())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl AttestationSource for FeedSource {
    fn name(&self) -> &str {
        "feed"
    }

    async fn fetch_attestations_for(&self, identity: &str) -> Result<Vec<Attestation>, SourceError> {
        self.index.fetch_attestations_for(identity).await
    }
}
