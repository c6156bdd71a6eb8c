//! Attestation source capability
//!
//! Fetches the attestations naming an identity as subject.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use trustmesh_core::Attestation;

/// Source fetch configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Per-fetch timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
        }
    }
}

/// Errors from attestation sources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Max retries ({0}) exceeded: {1}")]
    MaxRetries(u32, String),

    #[error("Feed I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    /// Whether retrying the same fetch could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Supplies attestations about an identity
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Attestations whose subject is `identity`
    ///
    /// An identity nobody attests to yields an empty list, not an error.
    async fn fetch_attestations_for(&self, identity: &str) -> Result<Vec<Attestation>, SourceError>;
}

/// Shared source handle
pub type SharedSource = Arc<dyn AttestationSource>;

#[async_trait]
impl<S: AttestationSource + ?Sized> AttestationSource for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_attestations_for(&self, identity: &str) -> Result<Vec<Attestation>, SourceError> {
        (**self).fetch_attestations_for(identity).await
    }
}
