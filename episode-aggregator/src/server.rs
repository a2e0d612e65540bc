//! HTTP boundary for the presentation layer.

use crate::aggregator::EpisodeAggregator;
use crate::cache::{EpisodeCache, DEFAULT_REVALIDATE_SECS};
use crate::types::{AggregatorError, EpisodeGroup, EpisodeRecord, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const DEFAULT_PAGE_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub revalidate_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            revalidate_secs: DEFAULT_REVALIDATE_SECS,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<EpisodeAggregator>,
    pub cache: Arc<EpisodeCache>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(aggregator: EpisodeAggregator, revalidate: Duration) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            cache: Arc::new(EpisodeCache::new(revalidate)),
            start_time: Instant::now(),
        }
    }

    async fn groups(&self) -> Result<Arc<Vec<EpisodeGroup>>> {
        let aggregator = self.aggregator.clone();
        self.cache.get_or_refresh(|| async move { aggregator.aggregate().await }).await
    }
}

/// Error body: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiErrorResponse { error: self.message })).into_response()
    }
}

impl From<AggregatorError> for ApiError {
    fn from(err: AggregatorError) -> Self {
        error!("Episode aggregation failed: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct EpisodesResponse {
    pub data: Vec<EpisodeGroup>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub episode: Option<EpisodeRecord>,
    pub episode_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub exclude: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodePage {
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub episodes: Vec<EpisodeRecord>,
}

fn all_episodes(groups: &[EpisodeGroup]) -> impl Iterator<Item = &EpisodeRecord> {
    groups.iter().flat_map(|group| group.episodes.iter())
}

/// Newest episode across all groups; the first one wins on equal dates.
pub fn latest_episode(groups: &[EpisodeGroup]) -> Option<&EpisodeRecord> {
    all_episodes(groups).min_by_key(|episode| Reverse(episode.sort_timestamp()))
}

/// Zero-based page of `episodes`. A page past the end clamps to the last page.
pub fn paginate(episodes: Vec<EpisodeRecord>, page: usize, size: usize) -> EpisodePage {
    let size = size.max(1);
    let total = episodes.len();
    let pages = total.div_ceil(size).max(1);
    let page = page.min(pages - 1);

    let episodes = episodes.into_iter().skip(page * size).take(size).collect();
    EpisodePage {
        page,
        pages,
        total,
        episodes,
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/episodes", get(list_episodes))
        .route("/api/episodes/latest", get(latest))
        .route("/api/episodes/page", get(episode_page))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_episodes(State(state): State<AppState>) -> ApiResult<Json<EpisodesResponse>> {
    let groups = state.groups().await?;
    Ok(Json(EpisodesResponse {
        data: groups.as_ref().clone(),
    }))
}

async fn latest(State(state): State<AppState>) -> ApiResult<Json<LatestResponse>> {
    let groups = state.groups().await?;
    Ok(Json(LatestResponse {
        episode: latest_episode(&groups).cloned(),
        episode_count: all_episodes(&groups).count(),
    }))
}

async fn episode_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<EpisodePage>> {
    let groups = state.groups().await?;
    let episodes: Vec<EpisodeRecord> = all_episodes(&groups)
        .filter(|episode| query.exclude.as_deref() != Some(episode.id.as_str()))
        .cloned()
        .collect();

    Ok(Json(paginate(
        episodes,
        query.page.unwrap_or(0),
        query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    )))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "uptime_secs": state.start_time.elapsed().as_secs(),
        })),
    )
}

pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Serving episodes on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
