use thiserror::Error;

/// Validation faults raised before scoring in strict mode
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("stall count must not be negative (got {0})")]
    NegativeStallCount(i64),

    #[error("stall duration must not be negative (got {0} ms)")]
    NegativeStallDuration(f64),

    #[error("startup delay must not be negative (got {0} ms)")]
    NegativeStartupDelay(f64),

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("missing-startup penalty must be a non-negative number (got {0} ms)")]
    InvalidStartupPenalty(f64),

    #[error("reference video duration must be positive (got {0} ms)")]
    InvalidReferenceDuration(f64),
}
