//! Scoring call errors

use thiserror::Error;

/// Errors from invalid scoring arguments
///
/// Missing data and transport failures never surface here; they lower the
/// score instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Depth bound must be non-negative, got {0}")]
    NegativeDepth(i64),

    #[error("Depth bound {requested} exceeds maximum of {max}")]
    DepthTooLarge { requested: i64, max: u32 },

    #[error("Identity must not be empty")]
    EmptyIdentity,
}
