use serde::{Deserialize, Serialize};

/// Video Stats snapshot (schema v2)
///
/// プレイヤーが再生中に集計したテレメトリのスナップショット。
/// スコア計算は読むだけで、書き換えない。
/// フィールド名はプレイヤー側の JSON に合わせて camelCase。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    #[serde(default)]
    pub stalls: StallStats,
    #[serde(default)]
    pub latency: LatencyStats,
    /// ms from playback request to first frame, None = unknown
    #[serde(default)]
    pub startup_delay: Option<f64>,
    #[serde(default)]
    pub bandwidth: BandwidthStats,
    #[serde(default)]
    pub level: LevelStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StallEvent {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StallStats {
    #[serde(default)]
    pub history: Vec<StallEvent>,
    #[serde(default)]
    pub current_start: Option<f64>,
    /// Signed so that malformed negatives reach validation instead of failing to parse
    #[serde(default)]
    pub total_count: i64,
    /// Cumulative stalled time in ms
    #[serde(default)]
    pub total_duration: f64,
    #[serde(default)]
    pub current_stall_time: Option<f64>,
}

/// Not consumed by scoring, carried for future extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    #[serde(default)]
    pub latest: Option<f64>,
    #[serde(default)]
    pub history: Vec<f64>,
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub jitter: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSample {
    pub value: f64,
    pub time: f64,
}

/// Not consumed by scoring, carried for future extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthStats {
    #[serde(default)]
    pub current_estimate: f64,
    #[serde(default)]
    pub history_estimates: Vec<BandwidthSample>,
    #[serde(default)]
    pub average: f64,
}

/// A selectable rendition as the video engine reports it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Level {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bitrate: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    pub level: Level,
    pub time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    #[serde(default)]
    pub latest: Option<Level>,
    #[serde(default)]
    pub history: Vec<LevelSample>,
    /// Lowest rendition observed during the session. This is the resolution signal scoring uses.
    #[serde(default)]
    pub lowest: Option<Level>,
}

/// Legacy flat snapshot (schema v1)
///
/// 旧プレイヤーが送ってくるフラットな形。受け口でだけ受け付けて、
/// すぐに v2 に変換する。スコア計算は v1 を知らない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyVideoStats {
    #[serde(default)]
    pub stalls_count: i64,
    #[serde(default)]
    pub stalls_duration: f64,
    #[serde(default)]
    pub startup_delay: Option<f64>,
    #[serde(default)]
    pub latency_history: Vec<f64>,
    #[serde(default)]
    pub bandwidth_history: Vec<f64>,
    /// Single current level
    #[serde(default)]
    pub level: Option<Level>,
}

/// Versioned stats document as accepted on the wire and from files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum StatsDocument {
    #[serde(rename = "v1")]
    V1(LegacyVideoStats),
    #[serde(rename = "v2")]
    V2(VideoStats),
}

impl StatsDocument {
    pub fn schema_name(&self) -> &'static str {
        match self {
            StatsDocument::V1(_) => "v1",
            StatsDocument::V2(_) => "v2",
        }
    }

    /// Migrate to the canonical schema
    pub fn into_current(self) -> VideoStats {
        match self {
            StatsDocument::V2(stats) => stats,
            StatsDocument::V1(legacy) => legacy.into(),
        }
    }
}

impl From<LegacyVideoStats> for VideoStats {
    fn from(legacy: LegacyVideoStats) -> Self {
        let latency = LatencyStats {
            latest: legacy.latency_history.last().copied(),
            average: mean(&legacy.latency_history),
            jitter: 0.0,
            history: legacy.latency_history,
        };

        // v1 never recorded sample times
        let bandwidth = BandwidthStats {
            current_estimate: legacy.bandwidth_history.last().copied().unwrap_or(0.0),
            average: mean(&legacy.bandwidth_history),
            history_estimates: legacy
                .bandwidth_history
                .iter()
                .map(|&value| BandwidthSample { value, time: 0.0 })
                .collect(),
        };

        // The current level is the only observation v1 has, so it doubles as the lowest
        let level = LevelStats {
            latest: legacy.level.clone(),
            history: Vec::new(),
            lowest: legacy.level,
        };

        VideoStats {
            stalls: StallStats {
                history: Vec::new(),
                current_start: None,
                total_count: legacy.stalls_count,
                total_duration: legacy.stalls_duration,
                current_stall_time: None,
            },
            latency,
            startup_delay: legacy.startup_delay,
            bandwidth,
            level,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
