//! TrustMesh Attestation Sources
//!
//! The scoring core never talks to relays itself. It is handed an
//! [`AttestationSource`] capability:
//! - [`MemorySource`]: in-process index, also used to simulate failures
//! - [`FeedSource`]: attestations loaded from a JSON or JSON-lines feed file
//! - [`GuardedSource`]: per-fetch timeout and bounded retry around any source

pub mod source;
pub mod memory;
pub mod feed;
pub mod guard;

pub use source::*;
pub use memory::*;
pub use feed::*;
pub use guard::*;
