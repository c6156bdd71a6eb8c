//! TrustMesh Walker
//!
//! Scores an identity by walking the attestation graph:
//! - Direct attestations are weighted and decayed
//! - Each issuer's own trust is resolved recursively, up to a depth bound
//! - Cycles and self-attestations contribute nothing
//! - Transport failures degrade an issuer to zero trust instead of failing
//!
//! ```no_run
//! use std::sync::Arc;
//! use trustmesh_source::MemorySource;
//! use trustmesh_walker::TrustScorer;
//!
//! # async fn run() -> Result<(), trustmesh_walker::ScoreError> {
//! let scorer = TrustScorer::new(Arc::new(MemorySource::new()));
//! let result = scorer.score("npub1example", 2).await?;
//! println!("{} -> {}", result.identity, result.display);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod visit;
pub mod scorer;

pub use error::*;
pub use graph::*;
pub use visit::*;
pub use scorer::*;
