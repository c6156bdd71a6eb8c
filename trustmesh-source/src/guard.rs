//! Timeout and retry guard for attestation sources

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use trustmesh_core::Attestation;

use crate::{AttestationSource, SourceConfig, SourceError};

/// Pause before retry `n` is `n * RETRY_BACKOFF`
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Wraps a source with a per-fetch timeout and bounded retries
pub struct GuardedSource<S> {
    inner: S,
    config: SourceConfig,
}

impl<S: AttestationSource> GuardedSource<S> {
    pub fn new(inner: S, config: SourceConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn attempt(&self, identity: &str) -> Result<Vec<Attestation>, SourceError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, self.inner.fetch_attestations_for(identity)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.config.timeout_secs)),
        }
    }
}

#[async_trait]
impl<S: AttestationSource> AttestationSource for GuardedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_attestations_for(&self, identity: &str) -> Result<Vec<Attestation>, SourceError> {
        let mut attempt = 0;

        loop {
            match self.attempt(identity).await {
                Ok(attestations) => return Ok(attestations),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(
                        "Fetch for {} from {} failed ({}), retry {}/{}",
                        identity,
                        self.inner.name(),
                        e,
                        attempt,
                        self.config.max_retries
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) if e.is_transient() => {
                    warn!("Giving up on {} from {}: {}", identity, self.inner.name(), e);
                    return Err(SourceError::MaxRetries(self.config.max_retries, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
