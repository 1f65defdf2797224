use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to do when the snapshot has no startup delay
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingStartupPolicy {
    /// Treat as 0 ms, i.e. the best possible startup score
    #[default]
    Zero,
    /// Substitute `missing_startup_penalty_ms`
    Penalty,
    /// Leave startup out of the weighted average
    Exclude,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Reject negative or non-finite inputs, clamp the result to [0, 1]
    #[default]
    Strict,
    /// Clamp inputs to >= 0 and every score to [0, 1], never fail
    Clamp,
    /// No validation, no clamping
    Legacy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Nominal session length stall time is measured against
    #[serde(default = "default_reference_duration")]
    pub reference_video_duration_ms: f64,
    #[serde(default)]
    pub missing_startup: MissingStartupPolicy,
    #[serde(default = "default_startup_penalty")]
    pub missing_startup_penalty_ms: f64,
    #[serde(default)]
    pub validation: ValidationMode,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reference_video_duration_ms: default_reference_duration(),
            missing_startup: MissingStartupPolicy::default(),
            missing_startup_penalty_ms: default_startup_penalty(),
            validation: ValidationMode::default(),
        }
    }
}

impl ScoringConfig {
    /// Reproduces the historical formula exactly: zero-filled startup, no validation, no clamping
    pub fn legacy() -> Self {
        Self {
            validation: ValidationMode::Legacy,
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    None,
    Tracing,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sink: SinkKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Max journal entries before rotation
    #[serde(default = "default_journal_max")]
    pub max_entries: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_journal_max(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionsConfig {
    /// Max tracked sessions before the least recently updated is evicted
    #[serde(default = "default_sessions_max")]
    pub max_entries: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_entries: default_sessions_max(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_web_address")]
    pub address: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_web_address(),
            port: default_web_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human format
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_true() -> bool { true }
fn default_reference_duration() -> f64 { 20_000.0 }
fn default_startup_penalty() -> f64 { 8_000.0 }
fn default_journal_max() -> usize { 10_000 }
fn default_sessions_max() -> usize { 10_000 }
fn default_web_address() -> String { "0.0.0.0".to_string() }
fn default_web_port() -> u16 { 8090 }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if !(config.scoring.reference_video_duration_ms > 0.0) {
            anyhow::bail!(
                "scoring.reference_video_duration_ms must be positive (got {})",
                config.scoring.reference_video_duration_ms
            );
        }
        let penalty = config.scoring.missing_startup_penalty_ms;
        if !penalty.is_finite() || penalty < 0.0 {
            anyhow::bail!(
                "scoring.missing_startup_penalty_ms must be a non-negative number (got {})",
                penalty
            );
        }
        if config.sessions.max_entries == 0 {
            anyhow::bail!("sessions.max_entries must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.scoring.reference_video_duration_ms, 20_000.0);
        assert_eq!(config.scoring.missing_startup, MissingStartupPolicy::Zero);
        assert_eq!(config.scoring.validation, ValidationMode::Strict);
        assert!(!config.diagnostics.enabled);
        assert!(config.journal.enabled);
        assert_eq!(config.sessions.max_entries, 10_000);
        assert_eq!(config.web.port, 8090);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [scoring]
            reference_video_duration_ms = 60000
            missing_startup = "penalty"
            missing_startup_penalty_ms = 4000
            validation = "clamp"

            [diagnostics]
            enabled = true
            sink = "tracing"

            [journal]
            max_entries = 50

            [sessions]
            max_entries = 25

            [web]
            address = "127.0.0.1"
            port = 9999

            [logging]
            json = true
        "#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.scoring.reference_video_duration_ms, 60_000.0);
        assert_eq!(config.scoring.missing_startup, MissingStartupPolicy::Penalty);
        assert_eq!(config.scoring.missing_startup_penalty_ms, 4_000.0);
        assert_eq!(config.scoring.validation, ValidationMode::Clamp);
        assert_eq!(config.diagnostics.sink, SinkKind::Tracing);
        assert_eq!(config.journal.max_entries, 50);
        assert_eq!(config.sessions.max_entries, 25);
        assert_eq!(config.web.address, "127.0.0.1");
        assert_eq!(config.web.port, 9999);
        assert!(config.logging.json);
    }

    #[test]
    fn test_rejects_non_positive_reference_duration() {
        assert!(Config::parse("[scoring]\nreference_video_duration_ms = 0").is_err());
        assert!(Config::parse("[scoring]\nreference_video_duration_ms = -5").is_err());
    }

    #[test]
    fn test_rejects_negative_startup_penalty() {
        assert!(Config::parse("[scoring]\nmissing_startup_penalty_ms = -8000").is_err());
        assert!(Config::parse("[scoring]\nmissing_startup_penalty_ms = -0.5").is_err());
        assert!(Config::parse("[scoring]\nmissing_startup_penalty_ms = nan").is_err());
        assert!(Config::parse("[scoring]\nmissing_startup_penalty_ms = 0").is_ok());
    }

    #[test]
    fn test_rejects_empty_session_board() {
        assert!(Config::parse("[sessions]\nmax_entries = 0").is_err());
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Config::parse("[scoring]\nmissing_startup = \"guess\"").is_err());
    }
}
