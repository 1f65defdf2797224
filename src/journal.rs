use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::JournalConfig;
use crate::score::ScoreBreakdown;

/// Score Journal - 計算したスコアを順番に記録する
///
/// 「さっきのセッション、なんでスコア低かった？」が後から引ける。
/// 上限を超えたら古いものから捨てる。
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub session_id: Option<String>,
    pub schema: String,
    pub total: f64,
    pub label: String,
    pub tier: String,
    pub startup_assumed: bool,
}

pub struct Journal {
    config: JournalConfig,
    entries: RwLock<Vec<JournalEntry>>,
    total_recorded: AtomicU64,
}

impl Journal {
    pub fn new(config: &JournalConfig) -> Self {
        Self {
            config: config.clone(),
            entries: RwLock::new(Vec::new()),
            total_recorded: AtomicU64::new(0),
        }
    }

    /// Record a computed score
    pub fn record(&self, session_id: Option<&str>, schema: &str, breakdown: &ScoreBreakdown) {
        if !self.config.enabled {
            return;
        }

        let entry = JournalEntry {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            session_id: session_id.map(str::to_string),
            schema: schema.to_string(),
            total: breakdown.total,
            label: breakdown.label.to_string(),
            tier: breakdown.tier.to_string(),
            startup_assumed: breakdown.startup_assumed,
        };

        let mut entries = self.entries.write();
        entries.push(entry);
        self.total_recorded.fetch_add(1, Ordering::Relaxed);

        // Rotation: keep within max_entries
        if entries.len() > self.config.max_entries {
            let drain_count = entries.len() - self.config.max_entries;
            entries.drain(..drain_count);
        }
    }

    /// Search by session, most recent first
    pub fn search(&self, session_id: Option<&str>, limit: usize) -> Vec<JournalEntry> {
        let entries = self.entries.read();
        entries.iter()
            .rev()
            .filter(|e| match session_id {
                Some(id) => e.session_id.as_deref() == Some(id),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Get journal stats
    pub fn get_stats(&self) -> serde_json::Value {
        let entries = self.entries.read();
        serde_json::json!({
            "enabled": self.config.enabled,
            "current_entries": entries.len(),
            "max_entries": self.config.max_entries,
            "total_recorded": self.total_recorded.load(Ordering::Relaxed),
        })
    }
}
