pub mod analysis;
pub mod api;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod price_source;
pub mod scanner;
pub mod yahoo;

use crate::config::AppConfig;
use crate::data_structures::SharedScanner;
use anyhow::Context;
use axum::{extract::FromRef, routing::get, Router};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub scanner: SharedScanner,
}

impl FromRef<AppState> for SharedScanner {
    fn from_ref(app_state: &AppState) -> SharedScanner {
        app_state.scanner.clone()
    }
}

/// JSON routes, mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/auto_trends", get(api::auto_trends_handler))
        .route("/momentum", get(api::momentum_handler))
        .route("/high_low_performers", get(api::high_low_performers_handler))
        .route("/moving_average", get(api::moving_average_handler))
        .route("/tickers", get(api::get_tickers_handler))
        .layer(CorsLayer::permissive())
}

pub fn app_router(api: Router<AppState>, state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index_handler))
        .nest("/api", api)
        .with_state(state)
}

pub fn build_router(state: AppState) -> Router {
    app_router(api_router(), state)
}

/// Full router with a per-IP limit on `/api`. Every API call fans out to
/// upstream once per ticker, so the page itself stays unthrottled.
///
/// Needs `into_make_service_with_connect_info::<SocketAddr>()` when served.
pub fn governed_router(state: AppState, config: &AppConfig) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.replenish_interval_secs)
            .burst_size(config.burst_size)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let api = api_router().layer(GovernorLayer::new(governor_conf));
    Ok(app_router(api, state))
}
