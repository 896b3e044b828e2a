use crate::config::AppConfig;
use crate::data_structures::{PriceBar, PriceSeries};
use crate::error::MarketDataError;
use crate::price_source::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const DAILY_INTERVAL: &str = "1d";

// --- Chart API response ---

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

pub struct YahooClient {
    client: Client,
    base_url: String,
    range: String,
    rate_limit_per_minute: u32,
    request_timestamps: Mutex<Vec<SystemTime>>,
    user_agents: Vec<String>,
}

impl YahooClient {
    pub fn new(
        base_url: &str,
        range: &str,
        timeout: Duration,
        rate_limit_per_minute: u32,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(YahooClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            range: range.to_string(),
            rate_limit_per_minute,
            request_timestamps: Mutex::new(Vec::new()),
            user_agents,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, MarketDataError> {
        Self::new(
            &config.yahoo_base_url,
            &config.history_range,
            config.request_timeout,
            config.rate_limit_per_minute,
        )
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    // The chart API rejects requests without a browser agent
    fn get_user_agent(&self) -> &str {
        use rand::seq::IndexedRandom;
        self.user_agents
            .choose(&mut rand::rng())
            .unwrap_or(&self.user_agents[0])
    }

    async fn enforce_rate_limit(&self) {
        if self.rate_limit_per_minute == 0 {
            return;
        }
        let mut timestamps = self.request_timestamps.lock().await;
        let current_time = SystemTime::now();

        // Remove timestamps older than 1 minute
        timestamps.retain(|&timestamp| {
            current_time.duration_since(timestamp).unwrap_or(Duration::ZERO) < Duration::from_secs(60)
        });

        if timestamps.len() >= self.rate_limit_per_minute as usize {
            if let Some(&oldest_request) = timestamps.first() {
                let elapsed = current_time.duration_since(oldest_request).unwrap_or(Duration::ZERO);
                let wait_time = Duration::from_secs(60).saturating_sub(elapsed);
                if !wait_time.is_zero() {
                    debug!(wait_ms = wait_time.as_millis(), "Rate limit reached, waiting");
                    sleep(wait_time + Duration::from_millis(100)).await;
                }
            }
        }

        timestamps.push(SystemTime::now());
    }

    #[instrument(skip(self), fields(range = %self.range))]
    pub async fn get_history(&self, symbol: &str) -> Result<PriceSeries, MarketDataError> {
        self.enforce_rate_limit().await;

        let url = self.chart_url(symbol);
        debug!(%url, "Requesting daily chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("range", self.range.as_str()),
                ("interval", DAILY_INTERVAL),
                ("includePrePost", "false"),
            ])
            .header("Accept", "application/json, text/plain, */*")
            .header("User-Agent", self.get_user_agent())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Unknown symbols come back as 404 with a chart.error payload
            if let Ok(ChartResponse { chart: Chart { error: Some(err), .. } }) =
                serde_json::from_str::<ChartResponse>(&body)
            {
                return Err(MarketDataError::Upstream { code: err.code, description: err.description });
            }
            return Err(MarketDataError::Status { symbol: symbol.to_string(), status: status.as_u16() });
        }

        let series = parse_chart_json(symbol, &body)?;
        info!(bars = series.len(), "Fetched daily history");
        Ok(series)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn daily_history(&self, symbol: &str) -> Result<PriceSeries, MarketDataError> {
        self.get_history(symbol).await
    }
}

/// Parses a chart API body into a [`PriceSeries`], dating bars in the
/// exchange's own timezone.
pub fn parse_chart_json(symbol: &str, body: &str) -> Result<PriceSeries, MarketDataError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(MarketDataError::Upstream { code: err.code, description: err.description });
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;

    let tz = result
        .meta
        .exchange_timezone_name
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC);

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let value_at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(close) = value_at(&closes, i) else {
            skipped += 1;
            continue;
        };

        let date = exchange_date(timestamp, tz).ok_or_else(|| {
            MarketDataError::InvalidResponse(format!("Invalid timestamp {} at index {}", timestamp, i))
        })?;

        bars.push(PriceBar {
            date,
            open: value_at(&opens, i).unwrap_or(close),
            high: value_at(&highs, i).unwrap_or(close),
            low: value_at(&lows, i).unwrap_or(close),
            close,
            volume: value_at(&volumes, i).map(|v| v.max(0.0) as u64).unwrap_or(0),
        });
    }

    if skipped > 0 {
        warn!(symbol, skipped, total = timestamps.len(), "Skipped bars without a close");
    }

    if bars.is_empty() {
        return Err(MarketDataError::NoData(symbol.to_string()));
    }

    Ok(PriceSeries::new(symbol, bars))
}

fn exchange_date(timestamp: i64, tz: Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&tz).date_naive())
}
