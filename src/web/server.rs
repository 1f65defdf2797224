use std::sync::Arc;
use axum::{
    Router,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::WebConfig;
use crate::engine::ScoringEngine;
use crate::metrics::render_metrics;
use crate::score::tiers::RESOLUTION_TIERS;
use crate::score::ScoreBreakdown;
use crate::stats::StatsDocument;

/// Web API server - プレイヤーからスナップショットを受け取って採点する
pub struct WebServer {
    engine: Arc<ScoringEngine>,
    config: WebConfig,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<ScoringEngine>,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub session_id: Option<String>,
    pub stats: StatsDocument,
}

#[derive(Deserialize)]
struct SessionQuery {
    session: Option<String>,
    limit: Option<usize>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

impl WebServer {
    pub fn new(engine: Arc<ScoringEngine>, config: &WebConfig) -> Self {
        Self {
            engine,
            config: config.clone(),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        if !self.config.enabled {
            info!("Web API disabled");
            return Ok(());
        }

        let app = router(self.engine.clone());

        let addr = format!("{}:{}", self.config.address, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind web API on {}: {}", addr, e))?;
        info!("🌐 Web API listening on http://{}", addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn router(engine: Arc<ScoringEngine>) -> Router {
    let state = AppState { engine };

    // Players post from the browser, usually from another origin
    Router::new()
        .route("/api/score", post(api_score))
        .route("/api/sessions", get(api_sessions))
        .route("/api/journal", get(api_journal))
        .route("/api/tiers", get(api_tiers))
        .route("/api/stats", get(api_stats))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Score API
async fn api_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreBreakdown>, ApiError> {
    state
        .engine
        .score_document(request.session_id.as_deref(), request.stats)
        .map(Json)
        .map_err(|e| {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        })
}

/// Sessions API - all sessions, or one with ?session=
async fn api_sessions(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match params.session {
        Some(id) => match state.engine.sessions.get(&id) {
            Some(session) => Ok(Json(serde_json::json!(session))),
            None => Err((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": format!("unknown session '{}'", id) })),
            )),
        },
        None => {
            let limit = params.limit.unwrap_or(100);
            let sessions: Vec<_> = state.engine.sessions.list().into_iter().take(limit).collect();
            Ok(Json(serde_json::json!({ "sessions": sessions })))
        }
    }
}

/// Journal API with search
async fn api_journal(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> Json<serde_json::Value> {
    let limit = params.limit.unwrap_or(100);
    let entries = state.engine.journal.search(params.session.as_deref(), limit);
    Json(serde_json::json!({
        "entries": entries,
        "stats": state.engine.journal.get_stats(),
    }))
}

/// Resolution tier table
async fn api_tiers() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "tiers": RESOLUTION_TIERS }))
}

/// Stats API
async fn api_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.get_stats())
}

/// Prometheus text exposition
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(&state.engine),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stats::{Level, VideoStats};

    fn state() -> AppState {
        AppState {
            engine: Arc::new(ScoringEngine::new(&Config::default())),
        }
    }

    fn perfect() -> StatsDocument {
        let mut stats = VideoStats::default();
        stats.startup_delay = Some(0.0);
        stats.level.lowest = Some(Level::new(1920, 1080));
        StatsDocument::V2(stats)
    }

    #[tokio::test]
    async fn test_score_endpoint() {
        let state = state();
        let request = ScoreRequest {
            session_id: Some("abc".to_string()),
            stats: perfect(),
        };
        let Json(breakdown) = api_score(State(state.clone()), Json(request)).await.unwrap();
        assert!((breakdown.total - 0.88).abs() < 1e-9);

        let query = SessionQuery { session: Some("abc".to_string()), limit: None };
        let Json(session) = api_sessions(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(session["times_scored"], 1);
        assert_eq!(session["latest"]["tier"], "1080p");
    }

    #[tokio::test]
    async fn test_score_endpoint_rejects_negative() {
        let mut stats = VideoStats::default();
        stats.stalls.total_count = -4;
        let request = ScoreRequest {
            session_id: None,
            stats: StatsDocument::V2(stats),
        };
        let (status, Json(body)) = api_score(State(state()), Json(request)).await.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("stall count"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let query = SessionQuery { session: Some("nope".to_string()), limit: None };
        let (status, _) = api_sessions(State(state()), Query(query)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_journal_and_tiers() {
        let state = state();
        for id in ["a", "b", "a"] {
            let request = ScoreRequest { session_id: Some(id.to_string()), stats: perfect() };
            api_score(State(state.clone()), Json(request)).await.unwrap();
        }
        let query = SessionQuery { session: Some("a".to_string()), limit: Some(10) };
        let Json(journal) = api_journal(State(state.clone()), Query(query)).await;
        assert_eq!(journal["entries"].as_array().unwrap().len(), 2);

        let Json(tiers) = api_tiers().await;
        let tiers = tiers["tiers"].as_array().unwrap();
        assert_eq!(tiers.len(), 8);
        assert_eq!(tiers[3]["label"], "720p");
        assert_eq!(tiers[3]["width"], 1280);
    }
}
