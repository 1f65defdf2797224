use std::sync::atomic::{AtomicU64, Ordering};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::config::SessionsConfig;
use crate::score::ScoreBreakdown;

/// Latest score per playback session
///
/// プレイヤーは同じセッションのスナップショットを何度も送ってくるので、
/// 最新の 1 件だけ残して、何回採点したかを数える。
/// 上限に達したら一番長く更新されていないセッションを追い出す。
#[derive(Debug, Clone, Serialize)]
pub struct SessionScore {
    pub session_id: String,
    pub latest: ScoreBreakdown,
    pub best_total: f64,
    pub worst_total: f64,
    pub times_scored: u64,
    pub updated_at: DateTime<Utc>,
    /// Update order, wall-clock timestamps can tie
    #[serde(skip)]
    touched: u64,
}

pub struct SessionBoard {
    sessions: DashMap<String, SessionScore>,
    max_entries: usize,
    clock: AtomicU64,
    evictions: AtomicU64,
}

impl SessionBoard {
    pub fn new(config: &SessionsConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            max_entries: config.max_entries.max(1),
            clock: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn update(&self, session_id: &str, breakdown: &ScoreBreakdown) {
        let total = breakdown.total;
        let touched = self.clock.fetch_add(1, Ordering::Relaxed);

        // Evict if at capacity
        if !self.sessions.contains_key(session_id) && self.sessions.len() >= self.max_entries {
            self.evict_one();
        }

        self.sessions
            .entry(session_id.to_string())
            .and_modify(|s| {
                s.latest = breakdown.clone();
                s.best_total = s.best_total.max(total);
                s.worst_total = s.worst_total.min(total);
                s.times_scored += 1;
                s.updated_at = Utc::now();
                s.touched = touched;
            })
            .or_insert_with(|| SessionScore {
                session_id: session_id.to_string(),
                latest: breakdown.clone(),
                best_total: total,
                worst_total: total,
                times_scored: 1,
                updated_at: Utc::now(),
                touched,
            });
    }

    /// Evict the least recently updated session
    fn evict_one(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|e| e.touched)
            .map(|e| e.key().clone());

        if let Some(key) = oldest {
            self.sessions.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn get(&self, session_id: &str) -> Option<SessionScore> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Most recently updated first
    pub fn list(&self) -> Vec<SessionScore> {
        let mut all: Vec<SessionScore> = self.sessions.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| b.touched.cmp(&a.touched));
        all
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScoringConfig, SessionsConfig};
    use crate::score::ScoreCalculator;
    use crate::stats::{Level, VideoStats};

    fn score(width: u32, height: u32) -> ScoreBreakdown {
        let mut stats = VideoStats::default();
        stats.startup_delay = Some(0.0);
        stats.level.lowest = Some(Level::new(width, height));
        ScoreCalculator::new(&ScoringConfig::default()).score(&stats).unwrap()
    }

    #[test]
    fn test_update_tracks_latest_and_range() {
        let board = SessionBoard::new(&SessionsConfig::default());
        board.update("s1", &score(1920, 1080));
        board.update("s1", &score(640, 360));
        board.update("s2", &score(1280, 720));

        assert_eq!(board.len(), 2);
        let s1 = board.get("s1").unwrap();
        assert_eq!(s1.times_scored, 2);
        assert_eq!(s1.latest.tier, "360p");
        assert!(s1.best_total > s1.worst_total);
        assert_eq!(s1.worst_total, s1.latest.total);
        assert!(board.get("missing").is_none());
        assert_eq!(board.list().len(), 2);
    }

    #[test]
    fn test_full_board_evicts_least_recently_updated() {
        let board = SessionBoard::new(&SessionsConfig { max_entries: 3 });
        let b = score(1280, 720);
        for id in ["s0", "s1", "s2"] {
            board.update(id, &b);
        }
        // Refresh s0 so s1 becomes the oldest
        board.update("s0", &b);
        board.update("s3", &b);

        assert_eq!(board.len(), 3);
        assert!(board.get("s1").is_none());
        assert!(board.get("s0").is_some());
        assert!(board.get("s3").is_some());
        assert_eq!(board.evictions(), 1);

        // Updating an existing session never evicts
        board.update("s2", &b);
        assert_eq!(board.len(), 3);
        assert_eq!(board.evictions(), 1);
    }

    #[test]
    fn test_board_stays_bounded() {
        let board = SessionBoard::new(&SessionsConfig { max_entries: 100 });
        let b = score(640, 360);
        for i in 0..1_000 {
            board.update(&format!("s{}", i), &b);
        }
        assert_eq!(board.len(), 100);
        assert!(board.get("s899").is_none());
        assert!(board.get("s900").is_some());
        assert_eq!(board.list()[0].session_id, "s999");
    }
}
