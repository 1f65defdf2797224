use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, SinkKind};
use crate::journal::Journal;
use crate::metrics::MetricsCounters;
use crate::score::{DiagnosticSink, NoopSink, ScoreBreakdown, ScoreCalculator, ScoreError, TracingSink};
use crate::sessions::SessionBoard;
use crate::stats::StatsDocument;

/// Core scoring engine - migrates documents, scores them and keeps the books
pub struct ScoringEngine {
    pub config: Config,
    pub calculator: ScoreCalculator,
    pub journal: Journal,
    pub sessions: SessionBoard,
    pub metrics: MetricsCounters,
}

impl ScoringEngine {
    pub fn new(config: &Config) -> Self {
        let sink: Arc<dyn DiagnosticSink> = match (config.diagnostics.enabled, config.diagnostics.sink) {
            (true, SinkKind::Tracing) => Arc::new(TracingSink),
            _ => Arc::new(NoopSink),
        };

        info!(
            "📐 Scoring: reference {} ms, missing startup {:?}, validation {:?}",
            config.scoring.reference_video_duration_ms,
            config.scoring.missing_startup,
            config.scoring.validation,
        );

        Self {
            config: config.clone(),
            calculator: ScoreCalculator::with_sink(&config.scoring, sink),
            journal: Journal::new(&config.journal),
            sessions: SessionBoard::new(&config.sessions),
            metrics: MetricsCounters::new(),
        }
    }

    /// Score one document of either schema version
    pub fn score_document(
        &self,
        session_id: Option<&str>,
        document: StatsDocument,
    ) -> Result<ScoreBreakdown, ScoreError> {
        let schema = document.schema_name();
        self.metrics.inc_schema(schema);
        if schema == "v1" {
            debug!("Migrating v1 snapshot (session {:?})", session_id);
        }

        let stats = document.into_current();
        let breakdown = match self.calculator.score(&stats) {
            Ok(b) => b,
            Err(e) => {
                warn!("Rejected snapshot (session {:?}): {}", session_id, e);
                self.metrics.record_rejection();
                return Err(e);
            }
        };

        if breakdown.startup_assumed {
            debug!(
                "Startup delay missing (session {:?}), substituted per {:?} policy",
                session_id, self.config.scoring.missing_startup
            );
        }

        self.metrics.record_score(&breakdown);
        self.journal.record(session_id, schema, &breakdown);
        if let Some(id) = session_id {
            self.sessions.update(id, &breakdown);
        }

        Ok(breakdown)
    }

    /// Get stats for Web UI
    pub fn get_stats(&self) -> serde_json::Value {
        let scoring = self.calculator.config();
        serde_json::json!({
            "scoring": {
                "reference_video_duration_ms": scoring.reference_video_duration_ms,
                "missing_startup": format!("{:?}", scoring.missing_startup).to_lowercase(),
                "missing_startup_penalty_ms": scoring.missing_startup_penalty_ms,
                "validation": format!("{:?}", scoring.validation).to_lowercase(),
            },
            "scores_total": self.metrics.scores_total.load(std::sync::atomic::Ordering::Relaxed),
            "rejected_total": self.metrics.rejected_total.load(std::sync::atomic::Ordering::Relaxed),
            "average_score": self.metrics.average_score(),
            "sessions": self.sessions.len(),
            "session_evictions": self.sessions.evictions(),
            "journal": self.journal.get_stats(),
        })
    }
}
