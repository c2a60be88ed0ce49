use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::pipeline::Pipeline;
use crate::store::Store;

const DEFAULT_TOP_SCORERS: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub pipeline: Arc<Pipeline>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Team not found")]
    TeamNotFound,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Failed to scrape data")]
    Scrape(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::TeamNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": self.to_string() })),
            )
                .into_response(),
            ApiError::InvalidQuery(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": self.to_string() })),
            )
                .into_response(),
            ApiError::Scrape(ref cause) => {
                error!("Scrape request failed: {:#}", cause);
                let body = json!({
                    "message": self.to_string(),
                    "error": format!("{:#}", cause),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Build the Axum router for the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/teams/:slug", get(team_handler))
        .route("/api/matches", get(matches_handler))
        .route("/api/matches/live", get(live_matches_handler))
        .route("/api/matches/upcoming", get(upcoming_matches_handler))
        .route("/api/standings", get(standings_handler))
        .route("/api/players/top-scorers", get(top_scorers_handler))
        .route("/api/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// POST /api/scrape
async fn scrape_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.pipeline.run_full().await.map_err(ApiError::Scrape)?;
    info!(
        "Scrape complete: {} matches, {} standings, {} players stored",
        summary.persisted.matches, summary.persisted.standings, summary.persisted.players
    );
    Ok(Json(json!({
        "message": "Data scraped and updated successfully",
        "scraped": summary.scraped,
        "persisted": summary.persisted,
    })))
}

/// GET /api/teams
async fn teams_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.teams())
}

/// GET /api/teams/:slug
async fn team_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .team_by_slug(&slug)
        .map(Json)
        .ok_or(ApiError::TeamNotFound)
}

/// GET /api/matches
async fn matches_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.matches())
}

/// GET /api/matches/live
async fn live_matches_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.live_matches())
}

/// GET /api/matches/upcoming
async fn upcoming_matches_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.upcoming_matches())
}

/// GET /api/standings
async fn standings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.standings())
}

#[derive(Debug, Deserialize)]
struct TopScorersQuery {
    limit: Option<usize>,
}

/// GET /api/players/top-scorers?limit=10
async fn top_scorers_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TopScorersQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    Ok(Json(
        state
            .store
            .top_scorers(query.limit.unwrap_or(DEFAULT_TOP_SCORERS)),
    ))
}

/// GET /api/health
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
