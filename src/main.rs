use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use qoe_score::config::Config;
use qoe_score::engine::ScoringEngine;
use qoe_score::score::ScoreBreakdown;
use qoe_score::stats::StatsDocument;
use qoe_score::web::server::WebServer;

const DEFAULT_CONFIG_PATH: &str = "qoe-score.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // qoe-score [config.toml] [--] [stats.json ...]
    let (config_path, stats_files) = split_args(std::env::args().skip(1).collect());

    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    init_tracing(config.logging.json);

    info!("📺 qoe-score v{} starting...", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!("Config loaded from {}", config_path);
    } else {
        warn!("Config file '{}' not found, using defaults", config_path);
    }

    let engine = Arc::new(ScoringEngine::new(&config));

    if !stats_files.is_empty() {
        return score_files(&engine, &stats_files);
    }

    let web = WebServer::new(engine.clone(), &config.web);
    web.run().await
}

/// The first argument is the config unless it is a stats file or `--`.
/// Everything after `--` is a stats file whatever its name.
fn split_args(mut args: Vec<String>) -> (String, Vec<String>) {
    let config_path = match args.first() {
        Some(first) if first != "--" && !is_stats_file(first) => args.remove(0),
        _ => DEFAULT_CONFIG_PATH.to_string(),
    };
    if args.first().map_or(false, |a| a == "--") {
        args.remove(0);
    }
    (config_path, args)
}

fn is_stats_file(arg: &str) -> bool {
    Path::new(arg)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

/// Logs go to stderr so one-shot mode can keep stdout for results
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qoe_score=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// One-shot mode: score each file and print one JSON line per file
fn score_files(engine: &ScoringEngine, files: &[String]) -> anyhow::Result<()> {
    let mut failures = 0usize;

    for file in files {
        let line = match score_file(engine, file) {
            Ok(breakdown) => serde_json::json!({ "file": file, "score": breakdown }),
            Err(e) => {
                error!("{}: {}", file, e);
                failures += 1;
                serde_json::json!({ "file": file, "error": e.to_string() })
            }
        };
        println!("{}", line);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} stats files could not be scored", failures, files.len());
    }
    Ok(())
}

fn score_file(engine: &ScoringEngine, path: &str) -> anyhow::Result<ScoreBreakdown> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read stats file '{}': {}", path, e))?;
    let document: StatsDocument = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse stats file '{}': {}", path, e))?;
    let session = Path::new(path).file_stem().and_then(|s| s.to_str());
    Ok(engine.score_document(session, document)?)
}
