pub mod calculator;
pub mod diagnostics;
pub mod error;
pub mod tiers;

pub use calculator::{compute_total_score, ScoreBreakdown, ScoreCalculator};
pub use diagnostics::{DiagnosticSink, NoopSink, TracingSink};
pub use error::ScoreError;
