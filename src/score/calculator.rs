use std::sync::Arc;

use serde::Serialize;

use crate::config::{MissingStartupPolicy, ScoringConfig, ValidationMode};
use crate::score::diagnostics::{DiagnosticSink, NoopSink};
use crate::score::error::ScoreError;
use crate::score::tiers;
use crate::stats::VideoStats;

/// Stall counts beyond this no longer lower the count score
const STALL_COUNT_CAP: i64 = 5;
const STALL_COUNT_PENALTY: f64 = 0.15;
/// Steepness of the stall-duration decay
const STALL_DURATION_DECAY: f64 = 10.0;
/// Startup delay (in seconds) at which the startup score halves
const STARTUP_HALF_SCORE_SECS: f64 = 8.0;
/// Used by clamp mode when the configured reference duration is unusable
const FALLBACK_REFERENCE_DURATION_MS: f64 = 20_000.0;

const STARTUP_WEIGHT: f64 = 1.0;
const QUALITY_WEIGHT: f64 = 2.0;
const STALLS_WEIGHT: f64 = 2.0;

/// Every intermediate value of one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    pub label: &'static str,
    /// None when startup was excluded from the average
    pub startup_score: Option<f64>,
    /// The snapshot had no startup delay and one was substituted
    pub startup_assumed: bool,
    pub stream_quality_score: f64,
    pub tier: &'static str,
    pub tier_index: usize,
    /// false when `level.lowest` was absent and 0x0 was used
    pub resolution_observed: bool,
    pub stall_count_score: f64,
    pub stall_duration_percentage: f64,
    pub stall_duration_score: f64,
    pub stalls_score: f64,
}

/// Everything the formula reads, after validation or clamping
#[derive(Debug, Clone, Copy)]
struct Inputs {
    stall_count: i64,
    stall_duration_ms: f64,
    startup_delay_ms: Option<f64>,
    width: u32,
    height: u32,
    resolution_observed: bool,
    reference_ms: f64,
    startup_penalty_ms: f64,
}

impl Inputs {
    fn new(stats: &VideoStats, config: &ScoringConfig) -> Self {
        let lowest = stats.level.lowest.as_ref();
        Self {
            stall_count: stats.stalls.total_count,
            stall_duration_ms: stats.stalls.total_duration,
            startup_delay_ms: stats.startup_delay,
            width: lowest.map(|l| l.width).unwrap_or(0),
            height: lowest.map(|l| l.height).unwrap_or(0),
            resolution_observed: lowest.is_some(),
            reference_ms: config.reference_video_duration_ms,
            startup_penalty_ms: config.missing_startup_penalty_ms,
        }
    }
}

/// QoE Score Calculator
///
/// テレメトリのスナップショットから 1 つのスコアを出す。
/// 状態を持たないので、Arc で共有して並列に呼んでも問題ない。
///
/// Formula:
///   startup  = 8 / (8 + startup_delay_secs)
///   quality  = tier score of level.lowest (width/height ceiling lookup, averaged)
///   stalls   = (1 - 0.15 * min(count, 5)) * e^(-10 * stall_ms / reference_ms)
///   total    = (startup + 2 * quality + 2 * stalls) / 5
pub struct ScoreCalculator {
    config: ScoringConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl ScoreCalculator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self::with_sink(config, Arc::new(NoopSink))
    }

    pub fn with_sink(config: &ScoringConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            config: config.clone(),
            sink,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a snapshot under the configured validation mode.
    ///
    /// Only `ValidationMode::Strict` can fail.
    pub fn score(&self, stats: &VideoStats) -> Result<ScoreBreakdown, ScoreError> {
        let raw = Inputs::new(stats, &self.config);
        let inputs = match self.config.validation {
            ValidationMode::Strict => self.validate(raw)?,
            ValidationMode::Clamp => clamp_inputs(raw),
            ValidationMode::Legacy => raw,
        };
        Ok(self.evaluate(inputs))
    }

    fn validate(&self, inputs: Inputs) -> Result<Inputs, ScoreError> {
        let reference = inputs.reference_ms;
        if !reference.is_finite() || reference <= 0.0 {
            return Err(ScoreError::InvalidReferenceDuration(reference));
        }
        // The substituted delay obeys the same rule as a recorded one
        let penalty = inputs.startup_penalty_ms;
        if self.config.missing_startup == MissingStartupPolicy::Penalty
            && (!penalty.is_finite() || penalty < 0.0)
        {
            return Err(ScoreError::InvalidStartupPenalty(penalty));
        }
        if inputs.stall_count < 0 {
            return Err(ScoreError::NegativeStallCount(inputs.stall_count));
        }
        if !inputs.stall_duration_ms.is_finite() {
            return Err(ScoreError::NonFinite { field: "stalls.totalDuration" });
        }
        if inputs.stall_duration_ms < 0.0 {
            return Err(ScoreError::NegativeStallDuration(inputs.stall_duration_ms));
        }
        if let Some(delay) = inputs.startup_delay_ms {
            if !delay.is_finite() {
                return Err(ScoreError::NonFinite { field: "startupDelay" });
            }
            if delay < 0.0 {
                return Err(ScoreError::NegativeStartupDelay(delay));
            }
        }
        Ok(inputs)
    }

    fn evaluate(&self, inputs: Inputs) -> ScoreBreakdown {
        let bounded = self.config.validation != ValidationMode::Legacy;
        // NaN maps to 0 so a bounded score is always a number
        let bound = |v: f64| {
            if !bounded {
                v
            } else if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, 1.0)
            }
        };

        // Startup
        let startup_delay = match (inputs.startup_delay_ms, self.config.missing_startup) {
            (Some(delay), _) => Some(delay),
            (None, MissingStartupPolicy::Zero) => Some(0.0),
            (None, MissingStartupPolicy::Penalty) => Some(inputs.startup_penalty_ms),
            (None, MissingStartupPolicy::Exclude) => None,
        };
        let startup_assumed = inputs.startup_delay_ms.is_none() && startup_delay.is_some();
        if let (true, Some(substituted)) = (startup_assumed, startup_delay) {
            self.sink.emit("startup_assumed", &[("substituted_delay_ms", substituted)]);
        }
        let startup = startup_delay.map(|d| bound(startup_score(d)));

        // Resolution
        let tier_index = tiers::tier_index(inputs.width, inputs.height);
        let tier = &tiers::RESOLUTION_TIERS[tier_index];
        let stream_quality = tier.score;

        // Stalls
        let reference = inputs.reference_ms;
        let duration_percentage = inputs.stall_duration_ms / reference;
        self.sink.emit(
            "stall_duration",
            &[
                ("stalls_duration_percentage", duration_percentage),
                ("stalls_duration", inputs.stall_duration_ms),
                ("video_duration", reference),
            ],
        );
        let count_score = bound(stall_count_score(inputs.stall_count));
        let duration_score = bound(stall_duration_score(duration_percentage));
        let stalls = bound(count_score * duration_score);

        match startup {
            Some(s) => self.sink.emit(
                "sub_scores",
                &[
                    ("startup_score", s),
                    ("stream_quality_score", stream_quality),
                    ("stalls_score", stalls),
                ],
            ),
            None => self.sink.emit(
                "sub_scores",
                &[("stream_quality_score", stream_quality), ("stalls_score", stalls)],
            ),
        }

        let total = bound(aggregate(startup, stream_quality, stalls));

        ScoreBreakdown {
            total,
            label: quality_label(total),
            startup_score: startup,
            startup_assumed,
            stream_quality_score: stream_quality,
            tier: tier.label,
            tier_index,
            resolution_observed: inputs.resolution_observed,
            stall_count_score: count_score,
            stall_duration_percentage: duration_percentage,
            stall_duration_score: duration_score,
            stalls_score: stalls,
        }
    }
}

fn clamp_inputs(inputs: Inputs) -> Inputs {
    Inputs {
        stall_count: inputs.stall_count.max(0),
        // f64::max also maps NaN to 0
        stall_duration_ms: inputs.stall_duration_ms.max(0.0),
        startup_delay_ms: inputs.startup_delay_ms.map(|d| d.max(0.0)),
        reference_ms: if inputs.reference_ms.is_finite() && inputs.reference_ms > 0.0 {
            inputs.reference_ms
        } else {
            FALLBACK_REFERENCE_DURATION_MS
        },
        startup_penalty_ms: inputs.startup_penalty_ms.max(0.0),
        ..inputs
    }
}

/// 0 ms -> 1.0, 8000 ms -> 0.5, decreasing toward 0
pub fn startup_score(startup_delay_ms: f64) -> f64 {
    STARTUP_HALF_SCORE_SECS / (STARTUP_HALF_SCORE_SECS + startup_delay_ms / 1000.0)
}

/// Floors at 0.25 once the count reaches the cap
pub fn stall_count_score(stall_count: i64) -> f64 {
    1.0 - STALL_COUNT_PENALTY * stall_count.min(STALL_COUNT_CAP) as f64
}

/// `duration_percentage` is stalled time as a fraction of the reference duration
pub fn stall_duration_score(duration_percentage: f64) -> f64 {
    (-STALL_DURATION_DECAY * duration_percentage).exp()
}

/// Weighted mean of the sub-scores. Without a startup score its weight drops out.
pub fn aggregate(startup: Option<f64>, stream_quality: f64, stalls: f64) -> f64 {
    match startup {
        Some(s) => {
            (STARTUP_WEIGHT * s + QUALITY_WEIGHT * stream_quality + STALLS_WEIGHT * stalls)
                / (STARTUP_WEIGHT + QUALITY_WEIGHT + STALLS_WEIGHT)
        }
        None => {
            (QUALITY_WEIGHT * stream_quality + STALLS_WEIGHT * stalls)
                / (QUALITY_WEIGHT + STALLS_WEIGHT)
        }
    }
}

/// Historical entry point: never fails, no validation, no clamping,
/// a missing startup delay counts as 0 ms.
pub fn compute_total_score(stats: &VideoStats) -> f64 {
    let calculator = ScoreCalculator::new(&ScoringConfig::legacy());
    calculator.evaluate(Inputs::new(stats, calculator.config())).total
}

/// Human-readable grade for dashboards
pub fn quality_label(score: f64) -> &'static str {
    match score {
        s if s >= 0.8 => "Excellent",
        s if s >= 0.6 => "Good",
        s if s >= 0.4 => "Fair",
        s if s >= 0.2 => "Poor",
        _ => "Bad",
    }
}
