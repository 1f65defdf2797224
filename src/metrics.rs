//! Prometheus-compatible metrics exporter for qoe-score
//!
//! Endpoint: GET /metrics (on the web port, default 8090)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::engine::ScoringEngine;
use crate::score::tiers::RESOLUTION_TIERS;
use crate::score::ScoreBreakdown;

const LABELS: [&str; 5] = ["Excellent", "Good", "Fair", "Poor", "Bad"];

/// Counters updated atomically from the scoring path
pub struct MetricsCounters {
    /// Snapshots scored successfully
    pub scores_total: AtomicU64,
    /// Snapshots rejected by validation
    pub rejected_total: AtomicU64,
    /// Scores where a missing startup delay was substituted
    pub startup_assumed_total: AtomicU64,
    /// Scores computed without an observed resolution
    pub resolution_unobserved_total: AtomicU64,
    /// Documents received per schema version
    pub schema_v1: AtomicU64,
    pub schema_v2: AtomicU64,
    /// Sum of totals in millionths, for the average
    pub total_sum_micro: AtomicU64,
    pub per_tier: [AtomicU64; 8],
    pub per_label: [AtomicU64; 5],
    pub start_time: Instant,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            scores_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            startup_assumed_total: AtomicU64::new(0),
            resolution_unobserved_total: AtomicU64::new(0),
            schema_v1: AtomicU64::new(0),
            schema_v2: AtomicU64::new(0),
            total_sum_micro: AtomicU64::new(0),
            per_tier: Default::default(),
            per_label: Default::default(),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn inc_schema(&self, schema: &str) {
        match schema {
            "v1" => self.schema_v1.fetch_add(1, Ordering::Relaxed),
            _ => self.schema_v2.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_score(&self, breakdown: &ScoreBreakdown) {
        self.scores_total.fetch_add(1, Ordering::Relaxed);
        // Legacy mode can go out of [0, 1]; the gauge only tracks the nominal range
        let micro = (breakdown.total.clamp(0.0, 1.0) * 1_000_000.0).round() as u64;
        self.total_sum_micro.fetch_add(micro, Ordering::Relaxed);
        if breakdown.startup_assumed {
            self.startup_assumed_total.fetch_add(1, Ordering::Relaxed);
        }
        if !breakdown.resolution_observed {
            self.resolution_unobserved_total.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(counter) = self.per_tier.get(breakdown.tier_index) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(i) = LABELS.iter().position(|l| *l == breakdown.label) {
            self.per_label[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejection(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn average_score(&self) -> f64 {
        let count = self.scores_total.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.total_sum_micro.load(Ordering::Relaxed) as f64 / 1_000_000.0 / count as f64
    }
}

/// Generate Prometheus-format metrics text
pub fn render_metrics(engine: &ScoringEngine) -> String {
    let mut out = String::with_capacity(4096);
    let c = &engine.metrics;

    let uptime = c.start_time.elapsed().as_secs_f64();
    write_help_type(&mut out, "qoe_up", "Whether the scoring service is up.", "gauge");
    writeln!(out, "qoe_up 1").ok();

    write_help_type(&mut out, "qoe_time_up_seconds_total", "Uptime since start in seconds.", "counter");
    writeln!(out, "qoe_time_up_seconds_total {:.3}", uptime).ok();

    // ──────────────────────────────────────────────
    // Scoring outcomes
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "qoe_scores_total", "Total number of snapshots scored.", "counter");
    writeln!(out, "qoe_scores_total {}", c.scores_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "qoe_rejected_total", "Total number of snapshots rejected by validation.", "counter");
    writeln!(out, "qoe_rejected_total {}", c.rejected_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "qoe_startup_assumed_total", "Scores where a missing startup delay was substituted.", "counter");
    writeln!(out, "qoe_startup_assumed_total {}", c.startup_assumed_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "qoe_resolution_unobserved_total", "Scores computed without an observed resolution.", "counter");
    writeln!(out, "qoe_resolution_unobserved_total {}", c.resolution_unobserved_total.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "qoe_score_avg", "Average score over all scored snapshots (0.0-1.0).", "gauge");
    writeln!(out, "qoe_score_avg {:.6}", c.average_score()).ok();

    // ──────────────────────────────────────────────
    // Schema versions
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "qoe_documents_total", "Documents received per schema version.", "counter");
    writeln!(out, "qoe_documents_total{{schema=\"v1\"}} {}", c.schema_v1.load(Ordering::Relaxed)).ok();
    writeln!(out, "qoe_documents_total{{schema=\"v2\"}} {}", c.schema_v2.load(Ordering::Relaxed)).ok();

    // ──────────────────────────────────────────────
    // Distribution
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "qoe_tier_total", "Scores per resolution tier.", "counter");
    for (tier, counter) in RESOLUTION_TIERS.iter().zip(c.per_tier.iter()) {
        write_counter_if_nonzero(&mut out, "qoe_tier_total", "tier", tier.label, counter.load(Ordering::Relaxed));
    }

    write_help_type(&mut out, "qoe_label_total", "Scores per quality label.", "counter");
    for (label, counter) in LABELS.iter().zip(c.per_label.iter()) {
        write_counter_if_nonzero(&mut out, "qoe_label_total", "label", label, counter.load(Ordering::Relaxed));
    }

    // ──────────────────────────────────────────────
    // Sessions / journal
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "qoe_sessions", "Number of sessions with a recorded score.", "gauge");
    writeln!(out, "qoe_sessions {}", engine.sessions.len()).ok();

    write_help_type(&mut out, "qoe_session_evictions_total", "Sessions evicted to keep the board bounded.", "counter");
    writeln!(out, "qoe_session_evictions_total {}", engine.sessions.evictions()).ok();

    write_help_type(&mut out, "qoe_journal_entries", "Entries currently held in the score journal.", "gauge");
    writeln!(out, "qoe_journal_entries {}", engine.journal.len()).ok();

    write_help_type(&mut out, "qoe_build_info", "qoe-score build information.", "gauge");
    writeln!(out, "qoe_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION")).ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}

fn write_counter_if_nonzero(out: &mut String, name: &str, label: &str, value: &str, count: u64) {
    if count > 0 {
        writeln!(out, "{}{{{}=\"{}\"}} {}", name, label, value, count).ok();
    }
}
