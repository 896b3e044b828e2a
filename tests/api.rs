use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;
use trend_scanner::{
    build_router,
    config::{AnalysisParams, AppConfig},
    data_structures::{PriceBar, PriceSeries},
    error::MarketDataError,
    governed_router,
    price_source::PriceSource,
    scanner::ScannerService,
    AppState,
};

struct FixtureSource(HashMap<String, Vec<f64>>);

#[async_trait]
impl PriceSource for FixtureSource {
    async fn daily_history(&self, symbol: &str) -> Result<PriceSeries, MarketDataError> {
        let closes = self
            .0
            .get(symbol)
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10_000,
            })
            .collect();
        Ok(PriceSeries::new(symbol, bars))
    }
}

fn ramp(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}

fn state(entries: Vec<(&str, Vec<f64>)>) -> AppState {
    let tickers = entries.iter().map(|(s, _)| s.to_string()).collect();
    let source = FixtureSource(entries.into_iter().map(|(s, c)| (s.to_string(), c)).collect());
    let scanner = ScannerService::new(Arc::new(source), tickers, AnalysisParams::default());
    AppState { scanner: Arc::new(scanner) }
}

fn app(entries: Vec<(&str, Vec<f64>)>) -> Router {
    build_router(state(entries))
}

fn market() -> Router {
    app(vec![
        ("RISER.NS", ramp(100.0, 1.0, 25)),
        ("FALLER.NS", ramp(200.0, -2.0, 25)),
        ("FLAT.NS", vec![50.0; 25]),
        ("NEW.NS", vec![10.0, 11.0]),
    ])
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn index_serves_html() {
    let response = market()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/api/auto_trends"));
}

#[tokio::test]
async fn auto_trends_reports_rising_and_falling() {
    let (status, body) = get(market(), "/api/auto_trends").await;
    assert_eq!(status, StatusCode::OK);

    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["symbol"], "RISER.NS");
    assert_eq!(results[0]["streak_type"], "rise");
    assert_eq!(results[0]["days"], 3);
    assert_eq!(results[0]["as_of"], "2025-09-25");
    assert_eq!(results[0]["prices"].as_array().unwrap().len(), 7);
    assert_eq!(results[0]["dates"][6], "25-Sep");
    assert_eq!(results[1]["symbol"], "FALLER.NS");
    assert_eq!(results[1]["streak_type"], "fall");
}

#[tokio::test]
async fn auto_trends_without_streaks_is_bad_request() {
    let (status, body) = get(app(vec![("FLAT.NS", vec![50.0; 10])]), "/api/auto_trends").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No trend data found");
}

#[tokio::test]
async fn momentum_is_sorted_descending() {
    let (status, body) = get(market(), "/api/momentum").await;
    assert_eq!(status, StatusCode::OK);

    let symbols: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["symbol"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(symbols, vec!["RISER.NS", "FLAT.NS", "FALLER.NS"]);
    // 124 / 119 - 1
    assert_eq!(body[0]["change_pct"], 4.2);
    assert_eq!(body[1]["change_pct"], 0.0);
}

#[tokio::test]
async fn high_low_performers_shape() {
    let (status, body) = get(market(), "/api/high_low_performers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["N"], 3);
    assert_eq!(body["period"], "5-Day (1 Week)");
    assert_eq!(body["high"][0]["symbol"], "RISER.NS");
    assert_eq!(body["low"][2]["symbol"], "FALLER.NS");
}

#[tokio::test]
async fn high_low_performers_shrinks_n() {
    let entries = vec![("A.NS", ramp(10.0, 1.0, 8)), ("B.NS", ramp(10.0, -1.0, 8))];
    let (status, body) = get(app(entries), "/api/high_low_performers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["N"], 1);
    assert_eq!(body["high"][0]["symbol"], "A.NS");
    assert_eq!(body["low"][0]["symbol"], "B.NS");
}

#[tokio::test]
async fn momentum_without_history_is_bad_request() {
    let (status, body) = get(app(vec![("NEW.NS", vec![1.0, 2.0])]), "/api/momentum").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid momentum data found");
}

#[tokio::test]
async fn moving_average_statuses() {
    let (status, body) = get(market(), "/api/moving_average").await;
    assert_eq!(status, StatusCode::OK);

    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["symbol"], "RISER.NS");
    assert_eq!(results[0]["status"], "Above SMA");
    assert_eq!(results[0]["sma_period"], 20);
    // last 20 closes are 105..=124, mean 114.5
    assert_eq!(results[0]["last_sma"], 114.5);
    assert_eq!(results[1]["status"], "Below SMA");
    assert_eq!(results[2]["symbol"], "FALLER.NS");
}

#[tokio::test]
async fn moving_average_without_history_is_bad_request() {
    let (status, body) = get(app(vec![("NEW.NS", vec![1.0, 2.0])]), "/api/moving_average").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid Moving Average data found");
}

#[tokio::test]
async fn tickers_lists_configuration() {
    let (status, body) = get(market(), "/api/tickers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    assert_eq!(body["tickers"][3], "NEW.NS");
}

async fn status_from(app: &Router, uri: &str, peer: SocketAddr) -> StatusCode {
    let request = Request::builder()
        .uri(uri)
        .extension(ConnectInfo(peer))
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn api_is_throttled_per_peer_after_burst() {
    let config = AppConfig {
        burst_size: 2,
        replenish_interval_secs: 60,
        ..AppConfig::default()
    };
    let app = governed_router(state(vec![("FLAT.NS", vec![50.0; 25])]), &config).unwrap();
    let peer = SocketAddr::from(([127, 0, 0, 1], 4000));

    for _ in 0..config.burst_size {
        assert_eq!(status_from(&app, "/api/tickers", peer).await, StatusCode::OK);
    }
    assert_eq!(status_from(&app, "/api/tickers", peer).await, StatusCode::TOO_MANY_REQUESTS);

    // the page is outside the limiter
    for _ in 0..5 {
        assert_eq!(status_from(&app, "/", peer).await, StatusCode::OK);
    }

    // a different client still has its own budget
    let other = SocketAddr::from(([127, 0, 0, 2], 4000));
    assert_eq!(status_from(&app, "/api/tickers", other).await, StatusCode::OK);
}

#[test]
fn invalid_rate_limit_is_rejected() {
    let config = AppConfig { burst_size: 0, ..AppConfig::default() };
    assert!(governed_router(state(vec![]), &config).is_err());
}
