use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::{filter_items, NewsAggregator};
use crate::enrichment::EnrichmentEngine;
use crate::types::{NewsItem, Result};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<NewsAggregator>,
    pub enricher: Arc<EnrichmentEngine>,
}

#[derive(Serialize)]
struct ListResponse {
    success: bool,
    data: Vec<NewsItem>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct ItemResponse {
    success: bool,
    data: NewsItem,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Deserialize)]
struct NewsQuery {
    region: Option<String>,
    query: Option<String>,
}

#[derive(Deserialize, Default)]
struct DetailQuery {
    #[serde(rename = "withHistory")]
    with_history: Option<bool>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/news", get(list_news))
        .route("/api/news/refresh", get(refresh_news))
        .route("/api/news/{id}", get(news_detail))
        .route("/api/health", get(health))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<NewsQuery>,
) -> impl IntoResponse {
    let all_news = state.aggregator.fetch_all(false).await;
    let data = filter_items(&all_news, params.region.as_deref(), params.query.as_deref());

    Json(ListResponse {
        success: true,
        total: data.len(),
        data,
        message: None,
    })
}

async fn refresh_news(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.aggregator.fetch_all(true).await;

    Json(ListResponse {
        success: true,
        total: data.len(),
        data,
        message: Some("Feeds refreshed".to_string()),
    })
}

async fn news_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DetailQuery>,
) -> Response {
    // Repopulates the cache after a restart; served from the snapshot
    // when it is still fresh.
    state.aggregator.fetch_all(false).await;

    let Some(mut item) = state.aggregator.get_by_id(&id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                success: false,
                error: "News item not found".to_string(),
            }),
        )
            .into_response();
    };

    if params.with_history.unwrap_or(false) && item.related_history.is_empty() {
        let analysis = state.enricher.enrich(&item).await;
        state.aggregator.attach_history(&id, &analysis).await;
        item.related_history = analysis.historical_events;
        item.historical_summary = Some(analysis.summary);
    }

    Json(ItemResponse {
        success: true,
        data: item,
    })
    .into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
