use crate::data_structures::{
    HighLowPerformers, MomentumRecord, SharedScanner, SmaDeviation, TickerList, TrendStreak,
};
use crate::error::ApiError;
use axum::{
    extract::{Json, State},
    response::{Html, IntoResponse},
};
use tracing::{debug, info, instrument};

const INDEX_HTML: &str = include_str!("../templates/index.html");

pub async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

#[instrument(skip(state))]
pub async fn auto_trends_handler(
    State(state): State<SharedScanner>,
) -> Result<Json<Vec<TrendStreak>>, ApiError> {
    debug!("Received request for auto trends");
    let results = state.auto_trends().await?;
    info!(count = results.len(), "Returning trend streaks");
    Ok(Json(results))
}

#[instrument(skip(state))]
pub async fn momentum_handler(
    State(state): State<SharedScanner>,
) -> Result<Json<Vec<MomentumRecord>>, ApiError> {
    debug!("Received request for momentum ranking");
    let ranked = state.momentum().await?;
    info!(count = ranked.len(), "Returning momentum ranking");
    Ok(Json(ranked))
}

#[instrument(skip(state))]
pub async fn high_low_performers_handler(
    State(state): State<SharedScanner>,
) -> Result<Json<HighLowPerformers>, ApiError> {
    debug!("Received request for high/low performers");
    let performers = state.high_low_performers().await?;
    info!(n = performers.n, "Returning high/low performers");
    Ok(Json(performers))
}

#[instrument(skip(state))]
pub async fn moving_average_handler(
    State(state): State<SharedScanner>,
) -> Result<Json<Vec<SmaDeviation>>, ApiError> {
    debug!("Received request for moving average deviation");
    let records = state.moving_average().await?;
    info!(count = records.len(), "Returning SMA deviation");
    Ok(Json(records))
}

#[instrument(skip(state))]
pub async fn get_tickers_handler(State(state): State<SharedScanner>) -> Json<TickerList> {
    let tickers = state.tickers().to_vec();
    debug!(count = tickers.len(), "Returning configured tickers");
    Json(TickerList { count: tickers.len(), tickers })
}
