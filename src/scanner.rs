use crate::analysis;
use crate::config::AnalysisParams;
use crate::data_structures::{
    HighLowPerformers, MomentumRecord, PriceSeries, SmaDeviation, TrendStreak,
};
use crate::error::ApiError;
use crate::price_source::PriceSource;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Runs each analytic over the configured tickers, one symbol at a time.
/// A ticker that fails to fetch or has too little history is logged and
/// skipped.
pub struct ScannerService {
    source: Arc<dyn PriceSource>,
    tickers: Vec<String>,
    params: AnalysisParams,
}

impl ScannerService {
    pub fn new(source: Arc<dyn PriceSource>, tickers: Vec<String>, params: AnalysisParams) -> Self {
        Self { source, tickers, params }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    async fn fetch(&self, symbol: &str) -> Option<PriceSeries> {
        match self.source.daily_history(symbol).await {
            Ok(series) if series.is_empty() => {
                warn!(symbol, "Empty data");
                None
            }
            Ok(series) => Some(series),
            Err(e) => {
                warn!(symbol, error = %e, "Failed to fetch price history");
                None
            }
        }
    }

    #[instrument(skip(self), fields(tickers = self.tickers.len()))]
    pub async fn auto_trends(&self) -> Result<Vec<TrendStreak>, ApiError> {
        let mut results = Vec::new();

        for symbol in &self.tickers {
            let Some(series) = self.fetch(symbol).await else { continue };
            match analysis::detect_trend_streak(&series, self.params.streak_min_days, self.params.chart_window) {
                Some(streak) => {
                    debug!(symbol, streak_type = ?streak.streak_type, days = streak.days, "Found trend streak");
                    results.push(streak);
                }
                None => debug!(symbol, "No qualifying streak"),
            }
        }

        if results.is_empty() {
            return Err(ApiError::NoResults("No trend data found"));
        }
        info!(found = results.len(), "Trend scan complete");
        Ok(results)
    }

    /// Momentum records for every ticker with enough history, ranked by
    /// `change_pct` descending.
    #[instrument(skip(self), fields(period = self.params.momentum_period))]
    pub async fn momentum(&self) -> Result<Vec<MomentumRecord>, ApiError> {
        let mut records = Vec::new();

        for symbol in &self.tickers {
            let Some(series) = self.fetch(symbol).await else { continue };
            match analysis::momentum(&series, self.params.momentum_period) {
                Some(record) => records.push(record),
                None => debug!(symbol, bars = series.len(), "Not enough history for momentum"),
            }
        }

        if records.is_empty() {
            return Err(ApiError::NoResults("No valid momentum data found"));
        }

        let ranked = analysis::rank_momentum(records);
        if ranked.is_empty() {
            return Err(ApiError::NoResults("No numeric momentum values"));
        }
        info!(ranked = ranked.len(), "Momentum ranking complete");
        Ok(ranked)
    }

    #[instrument(skip(self), fields(top_n = self.params.top_n))]
    pub async fn high_low_performers(&self) -> Result<HighLowPerformers, ApiError> {
        let ranked = self.momentum().await?;
        Ok(analysis::high_low_performers(
            &ranked,
            self.params.top_n,
            self.params.momentum_period,
        ))
    }

    #[instrument(skip(self), fields(period = self.params.sma_period))]
    pub async fn moving_average(&self) -> Result<Vec<SmaDeviation>, ApiError> {
        let mut records = Vec::new();

        for symbol in &self.tickers {
            let Some(series) = self.fetch(symbol).await else { continue };
            match analysis::sma_deviation(&series, self.params.sma_period) {
                Some(record) => records.push(record),
                None => debug!(symbol, bars = series.len(), "Not enough history for SMA"),
            }
        }

        if records.is_empty() {
            return Err(ApiError::NoResults("No valid Moving Average data found"));
        }
        Ok(analysis::rank_sma_deviation(records))
    }
}
