use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use coinpulse_core::{
    articles::GeneratedArticle,
    market::{MarketHistory, MarketMetadata, MarketSnapshot},
};

use crate::{error::ApiResult, main_lib::AppState};

const DEFAULT_HISTORY_HOURS: i64 = 24;

async fn latest_market(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MarketSnapshot>>> {
    Ok(Json(state.dashboard.latest_market()?))
}

#[derive(Deserialize)]
struct HistoryQuery {
    symbol: String,
    hours: Option<i64>,
}

async fn market_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<MarketHistory>> {
    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    let history = state.dashboard.market_history(&query.symbol, hours).await?;
    Ok(Json(history))
}

#[derive(Deserialize)]
struct HistoriesQuery {
    /// Comma-separated symbols.
    symbols: String,
    hours: Option<i64>,
}

async fn market_histories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoriesQuery>,
) -> ApiResult<Json<Vec<MarketHistory>>> {
    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    let symbols: Vec<String> = query.symbols.split(',').map(str::to_string).collect();
    let histories = state.dashboard.market_histories(&symbols, hours).await?;
    Ok(Json(histories))
}

async fn market_metadata(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MarketMetadata>>> {
    Ok(Json(state.dashboard.metadata()?))
}

async fn latest_article(State(state): State<Arc<AppState>>) -> ApiResult<Json<GeneratedArticle>> {
    Ok(Json(state.dashboard.current_article()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market/latest", get(latest_market))
        .route("/market/history", get(market_history))
        .route("/market/histories", get(market_histories))
        .route("/market/metadata", get(market_metadata))
        .route("/articles/latest", get(latest_article))
}
